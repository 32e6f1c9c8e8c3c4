use crate::{parser::parse_str, report::Report};

#[test]
fn report_lists_every_cause() {
    let report = Report::from(parse_str("p cnf 1 1\n2 0\n").unwrap_err());

    let messages: Vec<String> = report.chain().map(|error| error.to_string()).collect();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0], "Clause on line 2 is out of range");
    assert!(messages[1].contains("only has 1 variables"));

    let printed = format!("{:?}", report);
    assert_eq!(
        printed,
        format!("{}\n\nCaused by:\n  0: {}\n", messages[0], messages[1])
    );
}

#[test]
fn report_without_cause() {
    let report = Report::from(parse_str("p cnf 2 1\n1 2\n").unwrap_err());

    assert_eq!(report.chain().count(), 1);
    assert_eq!(format!("{:?}", report), "The last clause is not terminated by 0\n");
}
