#[cfg(test)]
mod error_handling_tests {
    use invoice_server::invoice::validation::{ValidationError, ValidationErrors};
    use invoice_server::ErrorResponse;

    #[test]
    fn test_error_response_kinds() {
        assert_eq!(ErrorResponse::not_found("Invoice 9 not found").error, "NotFound");
        assert_eq!(ErrorResponse::unprocessable("Invalid JSON body").error, "UnprocessableEntity");
        assert_eq!(ErrorResponse::internal_error("Server error").error, "InternalServerError");
    }

    #[test]
    fn test_error_response_omits_empty_fields() {
        let json = serde_json::to_value(ErrorResponse::not_found("missing")).unwrap();
        assert_eq!(json["error"], "NotFound");
        assert_eq!(json["message"], "missing");
        assert!(json.get("fields").is_none());
        assert!(json["timestamp"].as_str().is_some());
    }

    #[test]
    fn test_validation_response_lists_fields() {
        let mut errors = ValidationErrors::new();
        errors.add(ValidationError::empty_field("client_name", "Client name"));
        errors.add(ValidationError::invalid_email("client_email"));

        let response = ErrorResponse::validation(&errors);
        assert_eq!(response.error, "ValidationFailed");
        assert_eq!(response.message, "Validation failed: 2 problems found");
        assert_eq!(response.fields.len(), 2);

        let json = serde_json::to_string(&response).unwrap();
        let back: ErrorResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(back.fields, response.fields);
    }

    #[test]
    fn test_special_characters_survive_serialization() {
        let message = "Client \"Acme\" <script>alert('x')</script> 🚀";
        let json = serde_json::to_string(&ErrorResponse::unprocessable(message)).unwrap();
        let back: ErrorResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(back.message, message);
    }
}
