#[cfg(test)]
mod tests {
    use crate::invoice::models::{compute_total, InvoiceInput, InvoiceStatus, LineItem, RawLineItem};
    use crate::invoice::money::{format_cents, parse_amount, AmountError};
    use crate::invoice::validation::Validator;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn raw(description: &str, quantity: &str, unit_price: &str) -> RawLineItem {
        RawLineItem {
            description: description.to_string(),
            quantity: quantity.to_string(),
            unit_price: unit_price.to_string(),
        }
    }

    fn input(items: Vec<RawLineItem>) -> InvoiceInput {
        InvoiceInput {
            client_name: "Acme Corp".to_string(),
            client_email: "billing@acme.example".to_string(),
            line_items: items,
        }
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("12"), Ok(1200));
        assert_eq!(parse_amount("12.5"), Ok(1250));
        assert_eq!(parse_amount(" 12.05 "), Ok(1205));
        assert_eq!(parse_amount("1,250.00"), Ok(125_000));
        assert_eq!(parse_amount(".75"), Ok(75));
        assert_eq!(parse_amount("0"), Ok(0));
    }

    #[test]
    fn test_parse_amount_rejects() {
        assert_eq!(parse_amount(""), Err(AmountError::Empty));
        assert_eq!(parse_amount("-3"), Err(AmountError::Negative));
        assert_eq!(parse_amount("1.234"), Err(AmountError::TooPrecise));
        assert_eq!(parse_amount("abc"), Err(AmountError::NotANumber));
        assert_eq!(parse_amount("."), Err(AmountError::NotANumber));
        assert_eq!(parse_amount("1e5"), Err(AmountError::NotANumber));
        assert_eq!(parse_amount("99999999999999999999"), Err(AmountError::TooLarge));
    }

    #[test]
    fn test_format_cents() {
        assert_eq!(format_cents(0), "0.00");
        assert_eq!(format_cents(5), "0.05");
        assert_eq!(format_cents(123_456), "1,234.56");
        assert_eq!(format_cents(100_000_000), "1,000,000.00");
        assert_eq!(format_cents(-250), "-2.50");
    }

    #[test]
    fn test_compute_total() {
        let items = vec![LineItem::new("a", 2, 1_000), LineItem::new("b", 3, 250)];
        assert_eq!(compute_total(&items), Some(2_750));
        assert_eq!(compute_total(&[]), Some(0));
        assert_eq!(compute_total(&[LineItem::new("big", i64::MAX, 2)]), None);
    }

    #[test]
    fn test_status_round_trip_through_str() {
        for status in [InvoiceStatus::Created, InvoiceStatus::Sent, InvoiceStatus::Failed] {
            assert_eq!(status.as_str().parse::<InvoiceStatus>(), Ok(status));
        }
        assert!("archived".parse::<InvoiceStatus>().is_err());
    }

    #[test]
    fn test_from_form_pairs_groups_rows_and_drops_blank_ones() {
        let input = InvoiceInput::from_form_pairs(pairs(&[
            ("client_name", "Acme Corp"),
            ("client_email", "billing@acme.example"),
            ("item_description", "Design"),
            ("item_quantity", "2"),
            ("item_unit_price", "100"),
            ("item_description", ""),
            ("item_quantity", ""),
            ("item_unit_price", ""),
            ("item_description", "Hosting"),
            ("item_quantity", "1"),
            ("item_unit_price", "9.99"),
            ("csrf", "ignored"),
        ]));

        assert_eq!(input.client_name, "Acme Corp");
        assert_eq!(input.line_items, vec![raw("Design", "2", "100"), raw("Hosting", "1", "9.99")]);
    }

    #[test]
    fn test_from_form_pairs_keeps_partial_rows() {
        let input = InvoiceInput::from_form_pairs(pairs(&[
            ("item_description", "Design"),
            ("item_quantity", "2"),
        ]));
        assert_eq!(input.line_items, vec![raw("Design", "2", "")]);
    }

    #[test]
    fn test_validate_valid_input() {
        let new_invoice = input(vec![raw(" Design ", "2", "100"), raw("Hosting", "3", "9.99")])
            .validate()
            .unwrap();

        assert_eq!(new_invoice.client_name, "Acme Corp");
        assert_eq!(new_invoice.line_items[0].description, "Design");
        assert_eq!(new_invoice.total_cents, 2 * 10_000 + 3 * 999);
    }

    #[test]
    fn test_total_equals_sum_of_subtotals_for_valid_inputs() {
        let prices = ["0", "0.01", "9.99", "120", "1,000.50", "3.3"];
        for (i, price) in prices.iter().enumerate() {
            for quantity in [1, 2, 7, 1000] {
                let items: Vec<RawLineItem> = (0..=i)
                    .map(|n| raw(&format!("item {}", n), &quantity.to_string(), price))
                    .collect();
                let invoice = input(items).validate().unwrap();
                let expected: i64 = invoice
                    .line_items
                    .iter()
                    .map(|item| item.quantity * item.unit_price_cents)
                    .sum();
                assert_eq!(invoice.total_cents, expected);
                assert_eq!(compute_total(&invoice.line_items), Some(invoice.total_cents));
            }
        }
    }

    #[test]
    fn test_validate_reports_field_level_errors() {
        let errors = InvoiceInput {
            client_name: "  ".to_string(),
            client_email: "not-an-email".to_string(),
            line_items: vec![raw("", "0", "1.234"), raw("Ok", "x", "")],
        }
        .validate()
        .unwrap_err();

        assert!(errors.has_field("client_name"));
        assert!(errors.has_field("client_email"));
        assert!(errors.has_field("line_items[0].description"));
        assert!(errors.has_field("line_items[0].quantity"));
        assert!(errors.has_field("line_items[0].unit_price"));
        assert!(errors.has_field("line_items[1].quantity"));
        assert!(errors.has_field("line_items[1].unit_price"));
        assert_eq!(errors.len(), 7);
    }

    #[test]
    fn test_validate_requires_line_items() {
        let errors = input(Vec::new()).validate().unwrap_err();
        assert!(errors.has_field("line_items"));
        assert!(errors.to_string().starts_with("Validation failed: 1 problem found"));
    }

    #[test]
    fn test_validate_rejects_price_above_maximum() {
        assert!(input(vec![raw("a", "100000", "1,000,000,000")]).validate().is_ok());

        let errors = input(vec![raw("a", "1", "1,000,000,000.01")]).validate().unwrap_err();
        assert!(errors.has_field("line_items[0].unit_price"));
        assert_eq!(errors.errors()[0].message, "Unit price is not valid: amount is too large");
    }
}
