use crate::ambient::{Claim, RequestView, SessionView};
use crate::record::{ContextMap, Identity};
use serde_json::Value;

/// Claim carrying the numeric participant id.
pub const PART_ID_CLAIM: &str = "bits_participant_partid";

const GIVEN_NAME_FRAGMENT: &str = "givenname";
const SURNAME_FRAGMENT: &str = "surname";
const SWAGGER_TOKEN: &str = "swagger";

/// One contributor to a merged [`ContextMap`].
///
/// Each variant carries its own key-naming rule; see [`merge`].
#[derive(Debug, Clone, Copy)]
pub enum ContextSource<'a> {
    /// `UserAgent`, `Route-{name}`, `queryString-{i}-{name}`, `Referrer`.
    Request(&'a RequestView),
    /// `UserClaim-{i}-{type}`, `i` starting at 1.
    Claims(&'a [Claim]),
    /// `Session-{key}` per key, then `SessionId`.
    Session(&'a SessionView),
    /// Caller map, every key prefixed with `prefix` (may be empty).
    Caller {
        entries: &'a ContextMap,
        prefix: &'a str,
    },
    /// Exception data bag under bare keys. A key that is already taken is
    /// index-qualified as `{key}-{n}` instead of being dropped.
    ExceptionData(&'a [(String, Value)]),
}

/// Merge sources in order into one flat map.
///
/// A key that is already present is never overwritten: the first writer
/// wins. Only exception data disambiguates instead of dropping.
pub fn merge(sources: &[ContextSource<'_>]) -> ContextMap {
    let mut map = ContextMap::new();
    for source in sources {
        merge_into(&mut map, *source);
    }
    map
}

/// Apply a single source to an existing map with the same rules as [`merge`].
pub fn merge_into(map: &mut ContextMap, source: ContextSource<'_>) {
    match source {
        ContextSource::Request(request) => merge_request(map, request),
        ContextSource::Claims(claims) => {
            for (i, claim) in claims.iter().enumerate() {
                insert_first(
                    map,
                    format!("UserClaim-{}-{}", i + 1, claim.claim_type),
                    Value::String(claim.value.clone()),
                );
            }
        }
        ContextSource::Session(session) => {
            for key in &session.keys {
                insert_first(map, format!("Session-{}", key), Value::String(key.clone()));
            }
            insert_first(map, "SessionId".to_string(), Value::String(session.id.clone()));
        }
        ContextSource::Caller { entries, prefix } => {
            for (key, value) in entries {
                insert_first(map, format!("{}{}", prefix, key), value.clone());
            }
        }
        ContextSource::ExceptionData(entries) => {
            for (key, value) in entries {
                insert_qualified(map, key, value.clone());
            }
        }
    }
}

fn merge_request(map: &mut ContextMap, request: &RequestView) {
    insert_first(
        map,
        "UserAgent".to_string(),
        Value::String(request.user_agent.clone().unwrap_or_default()),
    );

    for (name, value) in &request.route_values {
        insert_first(map, format!("Route-{}", name), Value::String(value.clone()));
    }

    let query = request.query_string.trim_start_matches('?');
    for (i, (name, value)) in url::form_urlencoded::parse(query.as_bytes()).enumerate() {
        insert_first(
            map,
            format!("queryString-{}-{}", i, name),
            Value::String(value.into_owned()),
        );
    }

    if let Some(referrer) = &request.referrer {
        let value = if referrer.to_ascii_lowercase().contains(SWAGGER_TOKEN) {
            "Swagger".to_string()
        } else {
            referrer.clone()
        };
        insert_first(map, "Referrer".to_string(), Value::String(value));
    }
}

fn insert_first(map: &mut ContextMap, key: String, value: Value) {
    if map.contains_key(&key) {
        tracing::debug!(key = %key, "context key already present, keeping first value");
        return;
    }
    map.insert(key, value);
}

fn insert_qualified(map: &mut ContextMap, key: &str, value: Value) {
    if !map.contains_key(key) {
        map.insert(key.to_string(), value);
        return;
    }
    let mut n = 1usize;
    loop {
        let candidate = format!("{}-{}", key, n);
        if !map.contains_key(&candidate) {
            map.insert(candidate, value);
            return;
        }
        n += 1;
    }
}

/// Resolve part id and display name from identity claims.
///
/// An unparsable or missing part id yields `0`. The user name is
/// `{GIVENNAME}.{SURNAME}`, upper-cased, with an empty segment for a
/// missing claim.
pub fn resolve_identity(claims: &[Claim]) -> Identity {
    let part_id = claims
        .iter()
        .find(|c| c.claim_type == PART_ID_CLAIM)
        .and_then(|c| match c.value.trim().parse::<i32>() {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::debug!(value = %c.value, error = %e, "unparsable part id claim");
                None
            }
        })
        .unwrap_or_default();

    let given = claim_containing(claims, GIVEN_NAME_FRAGMENT);
    let surname = claim_containing(claims, SURNAME_FRAGMENT);

    Identity {
        part_id,
        user_name: format!("{}.{}", given, surname),
    }
}

fn claim_containing(claims: &[Claim], fragment: &str) -> String {
    claims
        .iter()
        .find(|c| c.claim_type.to_lowercase().contains(fragment))
        .map(|c| c.value.to_uppercase())
        .unwrap_or_default()
}

/// `"{method} {route template}"`; the template part is empty when no
/// route matched.
pub fn resolve_location(request: &RequestView) -> String {
    format!(
        "{} {}",
        request.method,
        request.route_template.as_deref().unwrap_or_default()
    )
}
