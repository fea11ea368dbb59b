use crate::harness::Scenario;
use devtrack_core::Timeframe;

#[test]
fn test_summary_sums_all_records() {
    Scenario::new("summary_sums_all_records")
        .project("app")
        .writes("app", "src/main.rs", b"fn main() {}\n")
        .captures("app")
        .writes("app", "src/main.rs", b"fn main() {}\nfn helper() {}\n")
        .captures("app")
        .writes("app", "src/lib.rs", b"pub fn lib() {}\n")
        .captures("app")
        .assert_record_count("app", 2)
        .assert_summary("app", Timeframe::All, 2, 0, 2)
        .run()
        .expect("scenario should pass");
}

#[test]
fn test_fresh_records_land_in_every_window() {
    // Both records were just written, so all four windows agree.
    Scenario::new("fresh_records_land_in_every_window")
        .project("app")
        .writes("app", "src/main.rs", b"fn main() {}\n")
        .captures("app")
        .writes("app", "src/main.rs", b"fn main() {}\nfn helper() {}\n")
        .captures("app")
        .assert_summary("app", Timeframe::Today, 1, 0, 1)
        .assert_summary("app", Timeframe::Week, 1, 0, 1)
        .assert_summary("app", Timeframe::Month, 1, 0, 1)
        .assert_summary("app", Timeframe::All, 1, 0, 1)
        .run()
        .expect("scenario should pass");
}

#[test]
fn test_summary_of_unknown_project_is_missing() {
    Scenario::new("summary_of_unknown_project_is_missing")
        .assert_summary_missing("ghost")
        .run()
        .expect("scenario should pass");
}

#[test]
fn test_summary_without_records_is_zeroed() {
    Scenario::new("summary_without_records_is_zeroed")
        .project("app")
        .assert_summary("app", Timeframe::Today, 0, 0, 0)
        .assert_summary("app", Timeframe::All, 0, 0, 0)
        .run()
        .expect("scenario should pass");
}
