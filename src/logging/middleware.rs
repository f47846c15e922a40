//! Relay correlation ids

use uuid::Uuid;

/// Generate a new relay id using UUID v4
///
/// Every relayed stream gets one; it is attached to the relay's log span and
/// echoed to the client in the `x-relay-id` response header.
///
/// # Examples
///
/// ```
/// use nydus::logging::generate_relay_id;
///
/// let relay_id = generate_relay_id();
/// assert_eq!(relay_id.len(), 36);
/// ```
pub fn generate_relay_id() -> String {
    Uuid::new_v4().to_string()
}
