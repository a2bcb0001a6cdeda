/*
 * Responsibility
 * - Success body shape shared by every handler: `{ "success": true, "message"?, ...body }`
 * - Error bodies live in crate::error (ErrorResponse)
 */
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    #[serde(flatten)]
    pub body: T,
}

/// `{ "data": ... }`
#[derive(Debug, Serialize)]
pub struct Data<T> {
    pub data: T,
}

#[derive(Debug, Serialize)]
pub struct Empty {}

impl<T> Envelope<T> {
    pub fn ok(body: T) -> Self {
        Self {
            success: true,
            message: None,
            body,
        }
    }

    pub fn with_message(mut self, message: &'static str) -> Self {
        self.message = Some(message);
        self
    }
}

impl<T> Envelope<Data<T>> {
    pub fn data(data: T) -> Self {
        Self::ok(Data { data })
    }
}

impl Envelope<Empty> {
    pub fn message(message: &'static str) -> Self {
        Self::ok(Empty {}).with_message(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn body_fields_are_flattened() {
        let v = serde_json::to_value(Envelope::data(vec![1, 2]).with_message("done")).unwrap();
        assert_eq!(v, json!({ "success": true, "message": "done", "data": [1, 2] }));
    }

    #[test]
    fn message_only() {
        let v = serde_json::to_value(Envelope::message("deleted")).unwrap();
        assert_eq!(v, json!({ "success": true, "message": "deleted" }));
    }
}
