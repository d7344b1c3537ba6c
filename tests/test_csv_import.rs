//! Tests for CSV parsing of bulk uploads.

mod fixtures;
mod mocks;

use contact_manager::import::{parse_contacts, SkipReason};
use contact_manager::ValidationRules;
use fixtures::*;

#[test]
fn test_header_and_single_row() {
    let csv = "Name,DateOfBirth,Married,Phone,Salary\nJohn Doe,1990-01-01,true,+15551234567,50000";
    let import = parse_contacts(csv.as_bytes()).unwrap();

    assert_eq!(import.candidates.len(), 1);
    let contact = &import.candidates[0];
    assert_eq!(contact.name, "John Doe");
    assert_eq!(contact.date_of_birth, date(1990, 1, 1));
    assert!(contact.married);
    assert_eq!(contact.phone, "+15551234567");
    assert_eq!(contact.salary, 50_000.0);

    // a parsed candidate is still subject to validation
    assert!(contact
        .validate(&ValidationRules::default(), date(2024, 1, 1))
        .is_ok());
}

#[test]
fn test_short_lines_are_dropped_and_reported() {
    let csv = "John Doe,1990-01-01,true,+15551234567,50000\nbroken,line\nJane Roe,1985-05-20,false,+15557654321,60000\n";
    let import = parse_contacts(csv.as_bytes()).unwrap();

    assert_eq!(import.candidates.len(), 2);
    assert_eq!(import.skipped.len(), 1);
    assert_eq!(import.skipped[0].line, 2);
    assert_eq!(import.skipped[0].reason, SkipReason::TooFewFields(2));
    assert_eq!(import.skipped[0].reason.to_string(), "expected 5 fields, found 2");
}

#[test]
fn test_empty_file_yields_no_candidates() {
    let import = parse_contacts(b"").unwrap();
    assert!(import.candidates.is_empty());
    assert!(import.skipped.is_empty());
}

#[test]
fn test_windows_line_endings() {
    let csv = "Name,DateOfBirth,Married,Phone,Salary\r\nJohn Doe,1990-01-01,TRUE,+15551234567,50000\r\nJane Roe,20.05.1985,False,+15557654321,60000.75\r\n";
    let import = parse_contacts(csv.as_bytes()).unwrap();

    assert!(import.skipped.is_empty());
    assert_eq!(import.candidates.len(), 2);
    assert_eq!(import.candidates[1].date_of_birth, date(1985, 5, 20));
    assert_eq!(import.candidates[1].salary, 60_000.75);
}

#[test]
fn test_large_file_parses_every_row() {
    let mut csv = String::from("Name,DateOfBirth,Married,Phone,Salary\n");
    for n in 0..500 {
        csv.push_str(&format!("Person Row,1990-01-01,false,{},100\n", phone(n)));
    }
    let import = parse_contacts(csv.as_bytes()).unwrap();
    assert_eq!(import.candidates.len(), 500);
    assert_eq!(import.candidates[499].phone, phone(499));
}

#[test]
fn test_parsed_candidates_import_in_file_order() {
    use contact_manager::server::{import_candidates, UploadStop};
    use mocks::MockContactService;

    let mock = MockContactService::new();
    let csv = "Name,DateOfBirth,Married,Phone,Salary\n\
               John Doe,1990-01-01,true,+15551234567,50000\n\
               J4ne,1985-05-20,false,+15557654321,60000\n\
               Max Power,1970-03-03,true,+15559999999,70000\n";
    let candidates = parse_contacts(csv.as_bytes()).unwrap().candidates;

    let report = tokio_test::block_on(import_candidates(
        &mock,
        &ValidationRules::default(),
        date(2024, 1, 1),
        candidates,
    ))
    .unwrap();

    assert_eq!(report.created, 1);
    match report.stopped {
        Some(UploadStop::Invalid { record, phone, errors }) => {
            assert_eq!(record, 2);
            assert_eq!(phone, "+15557654321");
            assert_eq!(errors, vec!["Name can only contain letters, spaces and hyphens"]);
        }
        other => panic!("Expected invalid stop, got: {:?}", other),
    }
    assert_eq!(mock.get_call_count("create"), 1);
}
