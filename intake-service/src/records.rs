//! Payment record parsing
//!
//! Accepts `date,payee,amount` rows from an uploaded CSV or pasted text.
//! A header line, blank lines and rows with a missing field or an
//! unparsable amount are dropped; extra columns are ignored.

use crate::error::Result;
use rust_decimal::Decimal;
use std::io::{BufRead, BufReader, Read};
use std::str::FromStr;
use tracing::debug;
use trust_engine::TransactionRecord;

/// Parse raw text into records, dropping malformed lines
pub fn parse_records(raw: &str) -> Vec<TransactionRecord> {
    // Reading from an in-memory slice cannot fail with an IO error.
    read_records(raw.as_bytes()).unwrap_or_default()
}

/// Parse records from any reader
///
/// Each line is read as its own CSV record, so an unbalanced quote only
/// costs the line it appears on.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<TransactionRecord>> {
    let mut records = Vec::new();
    let mut dropped = 0usize;

    for (index, line) in BufReader::new(reader).split(b'\n').enumerate() {
        let line = line?;
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        match read_line(&line).as_ref().and_then(parse_row) {
            Some(record) => records.push(record),
            None => {
                debug!(line = index + 1, "dropping malformed record");
                dropped += 1;
            }
        }
    }

    debug!(parsed = records.len(), dropped, "payment records parsed");
    Ok(records)
}

fn read_line(line: &[u8]) -> Option<csv::StringRecord> {
    let mut csv = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(line);

    let mut row = csv::StringRecord::new();
    match csv.read_record(&mut row) {
        Ok(true) => Some(row),
        Ok(false) => None,
        Err(e) => {
            debug!(error = %e, "unreadable record");
            None
        }
    }
}

fn parse_row(row: &csv::StringRecord) -> Option<TransactionRecord> {
    if row.len() < 3 {
        return None;
    }

    let date = row.get(0)?;
    let payee = row.get(1)?;
    let amount = parse_amount(row.get(2)?)?;

    if payee.is_empty() {
        return None;
    }

    Some(TransactionRecord::new(date, payee, amount))
}

fn parse_amount(raw: &str) -> Option<Decimal> {
    let cleaned = raw.trim_start_matches('₹').trim();
    Decimal::from_str(cleaned)
        .or_else(|_| Decimal::from_scientific(cleaned))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_and_malformed_lines_dropped() {
        let raw = "date,payee,amount\n\
                   2025-08-01, x@upi, 50\n\
                   \n\
                   2025-08-02,x@upi\n\
                   2025-08-03,y@upi,abc\n\
                   2025-08-04,y@upi,800,extra\n";

        let records = parse_records(raw);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].payee, "x@upi");
        assert_eq!(records[0].amount, Decimal::from(50));
        assert_eq!(records[1].amount, Decimal::from(800));
    }

    #[test]
    fn test_decimal_and_rupee_amounts() {
        let records = parse_records("2025-08-01,shop@upi,₹1999.50\n2025-08-02,shop@upi,1e3\n");
        assert_eq!(records[0].amount, Decimal::new(199950, 2));
        assert_eq!(records[1].amount, Decimal::from(1000));
    }

    #[test]
    fn test_blank_payee_dropped() {
        assert!(parse_records("2025-08-01,,50\n").is_empty());
    }

    #[test]
    fn test_unbalanced_quote_drops_only_its_line() {
        let raw = "2025-08-01,\"x@upi,50\n2025-08-02,y@upi,800\n2025-08-03,z@upi,60\n";
        let records = parse_records(raw);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].payee, "y@upi");
        assert_eq!(records[1].payee, "z@upi");
    }

    #[test]
    fn test_quoted_fields_and_crlf() {
        let records = parse_records("2025-08-01,\"shop@upi\",\"1200\"\r\n2025-08-02,a@upi,5\r\n");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].payee, "shop@upi");
        assert_eq!(records[0].amount, Decimal::from(1200));
        assert_eq!(records[1].amount, Decimal::from(5));
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_records("").is_empty());
    }
}
