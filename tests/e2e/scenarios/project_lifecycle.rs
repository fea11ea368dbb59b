use crate::harness::Scenario;

#[test]
fn test_rename_carries_records() {
    Scenario::new("rename_carries_records")
        .project("alpha")
        .writes("alpha", "src/main.rs", b"fn main() {}\n")
        .captures("alpha")
        .writes("alpha", "src/main.rs", b"fn main() {}\nfn more() {}\n")
        .captures("alpha")
        .assert_record_count("alpha", 1)
        .renames_project("alpha", "omega")
        .assert_project_exists("alpha", false)
        .assert_project_exists("omega", true)
        .assert_record_count("alpha", 0)
        .assert_record_count("omega", 1)
        .run()
        .expect("scenario should pass");
}

#[test]
fn test_delete_cascades_to_records() {
    Scenario::new("delete_cascades_to_records")
        .project("alpha")
        .writes("alpha", "src/main.rs", b"fn main() {}\n")
        .captures("alpha")
        .writes("alpha", "src/main.rs", b"fn main() {}\nfn more() {}\n")
        .captures("alpha")
        .assert_record_count("alpha", 1)
        .deletes_project("alpha")
        .assert_project_exists("alpha", false)
        .assert_record_count("alpha", 0)
        .assert_summary_missing("alpha")
        .run()
        .expect("scenario should pass");
}

#[test]
fn test_clear_keeps_the_project() {
    Scenario::new("clear_keeps_the_project")
        .project("alpha")
        .writes("alpha", "src/main.rs", b"fn main() {}\n")
        .captures("alpha")
        .writes("alpha", "src/main.rs", b"fn main() {}\nfn more() {}\n")
        .captures("alpha")
        .assert_record_count("alpha", 1)
        .clears_records("alpha")
        .assert_record_count("alpha", 0)
        .assert_project_exists("alpha", true)
        .run()
        .expect("scenario should pass");
}

#[test]
fn test_two_projects_are_isolated() {
    Scenario::new("two_projects_are_isolated")
        .project("alpha")
        .project("beta")
        .writes("alpha", "src/main.rs", b"fn main() {}\n")
        .writes("beta", "src/main.rs", b"fn main() {}\n")
        .captures("alpha")
        .captures("beta")
        .writes("alpha", "src/main.rs", b"fn main() {}\nfn more() {}\n")
        .captures("alpha")
        .assert_record_count("alpha", 1)
        .assert_record_count("beta", 0)
        .deletes_project("beta")
        .assert_record_count("alpha", 1)
        .run()
        .expect("scenario should pass");
}
