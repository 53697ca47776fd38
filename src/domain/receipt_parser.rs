//! Extraction of order data from the text of an "accusé de réception" PDF.
//!
//! The text comes from an upstream PDF-to-text step. Parsing is positional
//! and tied to one document layout: it never fails, it leaves fields empty
//! when it cannot find them and the caller decides what is required.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

static ARC_AFTER_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)ACCUS[EÉ]\s+DE\s+R[EÉ]CEPTION\s*(?:N\s?[°º]|NO\.?)?\s*:?\s*(\d{6,})")
        .expect("valid regex")
});
static ARC_ANYWHERE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bN\s?[°º]\s*:?\s*(\d{6,})").expect("valid regex"));

static DATE_AFTER_COMMANDE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)COMMANDE\s+DU\s+(\d{1,2})/(\d{1,2})/(\d{4})").expect("valid regex")
});
static DATE_AFTER_DU: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bdu\s+(\d{1,2})/(\d{1,2})/(\d{4})").expect("valid regex"));

static POSTAL_CODE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{5}\s+\S").expect("valid regex"));

// quantity, unit price, line amount; French decimal comma
static QUANTITY_ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+),\d{2}\s+\d[\d .\x{A0}]*,\d{2}\s+\d[\d .\x{A0}]*,\d{2}$")
        .expect("valid regex")
});

const BANNED_LABEL_PARTS: [&str; 3] = ["TRANSPORT", "REP ", "REP\u{a0}"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedProduct {
    pub pdf_label: String,
    pub quantity: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedOrder {
    pub arc: Option<String>,
    pub client_name: Option<String>,
    pub order_date: Option<NaiveDate>,
    pub products: Vec<ParsedProduct>,
}

pub fn parse_receipt_text(raw: &str) -> ParsedOrder {
    let text = raw.replace("\r\n", "\n").replace('\r', "\n");
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    ParsedOrder {
        arc: extract_arc(&text),
        client_name: extract_client_name(&lines),
        order_date: extract_order_date(&text),
        products: extract_products(&lines),
    }
}

fn extract_arc(text: &str) -> Option<String> {
    [&*ARC_AFTER_HEADER, &*ARC_ANYWHERE]
        .iter()
        .find_map(|re| re.captures(text))
        .map(|caps| caps[1].to_string())
}

/// The first date pattern that matches decides; an impossible date there
/// yields `None` rather than falling through to the next pattern.
fn extract_order_date(text: &str) -> Option<NaiveDate> {
    let caps = [&*DATE_AFTER_COMMANDE, &*DATE_AFTER_DU]
        .iter()
        .find_map(|re| re.captures(text))?;
    let day = caps[1].parse().ok()?;
    let month = caps[2].parse().ok()?;
    let year = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn extract_client_name(lines: &[&str]) -> Option<String> {
    lines
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, line)| POSTAL_CODE_LINE.is_match(line))
        .map(|(i, _)| lines[i - 1].to_string())
}

fn extract_products(lines: &[&str]) -> Vec<ParsedProduct> {
    let mut products = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let Some(quantity) = row_quantity(lines[i]) else {
            i += 1;
            continue;
        };

        if let Some(label) = lines.get(i + 1).filter(|l| is_product_label(l)) {
            products.push(ParsedProduct {
                pdf_label: label.to_string(),
                quantity,
            });
        }

        // label line + one metadata line, whether or not the label was kept
        i += 3;
    }

    products
}

fn row_quantity(line: &str) -> Option<i32> {
    QUANTITY_ROW.captures(line)?[1].parse().ok()
}

fn is_product_label(label: &str) -> bool {
    let upper = label.to_uppercase();
    !label.is_empty() && !BANNED_LABEL_PARTS.iter().any(|banned| upper.contains(banned))
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECEIPT: &str = "SOCIETE DES CARRIERES\r\n\
        ACCUSE DE RECEPTION n°123456\r\n\
        COMMANDE DU 05/03/2024\r\n\
        \r\n\
        TERRASSEMENTS DUPONT\r\n\
        69100 VILLEURBANNE\r\n\
        Quantité Prix unitaire Montant\r\n\
        3,00 150,00 450,00\r\n\
        (12) BIG BAG 1000KG\r\n\
        Réf. 0012 - lot A\r\n\
        10,00 1 200,00 12 000,00\r\n\
        (40) GRAVIER 6/10\r\n\
        Réf. 0040\r\n";

    #[test]
    fn parses_a_complete_receipt() {
        let parsed = parse_receipt_text(RECEIPT);

        assert_eq!(parsed.arc.as_deref(), Some("123456"));
        assert_eq!(parsed.order_date, NaiveDate::from_ymd_opt(2024, 3, 5));
        assert_eq!(parsed.client_name.as_deref(), Some("TERRASSEMENTS DUPONT"));
        assert_eq!(
            parsed.products,
            vec![
                ParsedProduct {
                    pdf_label: "(12) BIG BAG 1000KG".to_string(),
                    quantity: 3,
                },
                ParsedProduct {
                    pdf_label: "(40) GRAVIER 6/10".to_string(),
                    quantity: 10,
                },
            ]
        );
    }

    #[test]
    fn minimal_receipt_from_header_date_and_one_row() {
        let parsed = parse_receipt_text(
            "ACCUSE DE RECEPTION n°123456\nCOMMANDE DU 05/03/2024\n3,00 150,00 450,00\n(12) BIG BAG 1000KG",
        );
        assert_eq!(parsed.arc.as_deref(), Some("123456"));
        assert_eq!(parsed.order_date, NaiveDate::from_ymd_opt(2024, 3, 5));
        assert_eq!(parsed.products.len(), 1);
        assert_eq!(parsed.products[0].pdf_label, "(12) BIG BAG 1000KG");
        assert_eq!(parsed.products[0].quantity, 3);
    }

    #[test]
    fn arc_falls_back_to_first_numero_marker() {
        let parsed = parse_receipt_text("Bon de commande N° 98765432\nautre n°111111");
        assert_eq!(parsed.arc.as_deref(), Some("98765432"));
    }

    #[test]
    fn short_numbers_are_not_an_arc() {
        assert_eq!(parse_receipt_text("ACCUSE DE RECEPTION n°12345").arc, None);
    }

    #[test]
    fn date_falls_back_to_du_pattern() {
        let parsed = parse_receipt_text("Livraison prévue\nEdité du 28/02/2024");
        assert_eq!(parsed.order_date, NaiveDate::from_ymd_opt(2024, 2, 28));
    }

    #[test]
    fn impossible_date_is_none() {
        assert_eq!(parse_receipt_text("COMMANDE DU 31/02/2024").order_date, None);
    }

    #[test]
    fn missing_fields_are_left_empty() {
        let parsed = parse_receipt_text("rien d'exploitable ici");
        assert_eq!(parsed, ParsedOrder::default());
    }

    #[test]
    fn postal_code_on_first_line_has_no_client() {
        assert_eq!(parse_receipt_text("75001 PARIS\nsuite").client_name, None);
    }

    #[test]
    fn banned_labels_are_dropped() {
        let parsed = parse_receipt_text(
            "1,00 80,00 80,00\nFRAIS DE TRANSPORT\nmeta\n\
             2,00 5,00 10,00\nREP PALETTE\nmeta\n\
             4,00 5,00 20,00\nRep\u{a0}consigne\nmeta\n\
             5,00 10,00 50,00\n(7) ROCHE CALCAIRE\nmeta",
        );
        assert_eq!(
            parsed.products,
            vec![ParsedProduct {
                pdf_label: "(7) ROCHE CALCAIRE".to_string(),
                quantity: 5,
            }]
        );
    }

    // Known brittle behaviour: the two-line skip after a row is positional,
    // so a row sitting right after a rejected label is swallowed.
    #[test]
    fn two_line_skip_applies_even_when_label_is_rejected() {
        let parsed = parse_receipt_text(
            "1,00 80,00 80,00\nTRANSPORT\n2,00 10,00 20,00\n(12) BIG BAG 1000KG\nmeta",
        );
        assert!(parsed.products.is_empty());
    }

    #[test]
    fn row_without_following_label_is_ignored() {
        assert!(parse_receipt_text("3,00 150,00 450,00").products.is_empty());
    }

    #[test]
    fn fractional_quantity_keeps_integer_part() {
        let parsed = parse_receipt_text("2,50 10,00 25,00\n(3) SAC 25KG\nmeta");
        assert_eq!(parsed.products[0].quantity, 2);
    }
}
