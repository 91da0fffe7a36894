//! BDD step definitions for the demo setup workflow

use cucumber::{given, then, when};
use serde_json::json;

use eduverse::error::DemoStep;
use eduverse::model::Student;
use eduverse::EduverseError;

use crate::world::EduverseWorld;

fn parse_step(s: &str) -> DemoStep {
    match s {
        "create_teacher" => DemoStep::CreateTeacher,
        "create_batch" => DemoStep::CreateBatch,
        "fetch_students" => DemoStep::FetchStudents,
        other => panic!("Unknown demo step: {}", other),
    }
}

#[given(expr = "the backend has {int} student(s) for institution {string}")]
fn backend_students(world: &mut EduverseWorld, count: usize, institution_id: String) {
    let students: Vec<Student> = (1..=count)
        .map(|i| {
            serde_json::from_value(json!({
                "_id": format!("s{}", i),
                "institution_id": institution_id,
                "name": format!("Student {}", i),
            }))
            .unwrap()
        })
        .collect();
    world.backend().configure(|b| b.students = students);
}

#[given(expr = "the backend fails the {string} step")]
fn backend_fails_step(world: &mut EduverseWorld, step_name: String) {
    let step = parse_step(&step_name);
    world.backend().configure(|b| b.failing_step = Some(step));
}

#[when("I run the demo setup")]
async fn run_demo_setup(world: &mut EduverseWorld) {
    let result = world.controller().demo_setup().await;
    world.demo_result = Some(result);
}

#[then(expr = "the demo setup should succeed for institution {string}")]
fn demo_succeeded(world: &mut EduverseWorld, institution_id: String) {
    match world.demo_result.as_ref().expect("demo setup not run") {
        Ok(report) => assert_eq!(report.institution_id, institution_id),
        Err(e) => panic!("demo setup failed: {}", e),
    }
}

#[then(expr = "the demo setup should fail at step {string}")]
fn demo_failed_at(world: &mut EduverseWorld, expected: String) {
    match world.demo_result.as_ref().expect("demo setup not run") {
        Err(EduverseError::DemoSetup { step, .. }) => assert_eq!(*step, parse_step(&expected)),
        other => panic!("expected a failed demo step, got {:?}", other),
    }
}

#[then("the demo setup should ask for an institution first")]
fn demo_needs_institution(world: &mut EduverseWorld) {
    let result = world.demo_result.as_ref().expect("demo setup not run");
    assert!(
        matches!(result, Err(EduverseError::NoInstitutions)),
        "got {:?}",
        result
    );
}

#[then(expr = "the demo requests should be {string}")]
fn demo_requests(world: &mut EduverseWorld, expected: String) {
    let actual: Vec<String> = world
        .backend()
        .calls()
        .iter()
        .filter(|c| c.path != "/institutions" && c.path != "/test")
        .map(|c| format!("{} {}", c.method, c.path))
        .collect();
    let expected: Vec<String> = expected
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    assert_eq!(actual, expected);
}

#[then(expr = "the teacher {string} should be created with email {string}")]
fn teacher_created(world: &mut EduverseWorld, name: String, email: String) {
    let calls = world.backend().calls();
    let body = calls
        .iter()
        .find(|c| c.path == "/users")
        .and_then(|c| c.body.clone())
        .expect("no teacher was created");
    assert_eq!(body["name"], name.as_str());
    assert_eq!(body["email"], email.as_str());
    assert_eq!(body["role"], "teacher");
}

#[then(expr = "the batch {string} should be created for subject {string}")]
fn batch_created(world: &mut EduverseWorld, name: String, subject: String) {
    let calls = world.backend().calls();
    let body = calls
        .iter()
        .find(|c| c.path == "/batches")
        .and_then(|c| c.body.clone())
        .expect("no batch was created");
    assert_eq!(body["name"], name.as_str());
    assert_eq!(body["subject"], subject.as_str());
}

#[then(expr = "the dashboard should show {int} student(s)")]
async fn students_shown(world: &mut EduverseWorld, expected: usize) {
    let state = world.controller().snapshot().await;
    assert_eq!(state.students.len(), expected);
}

#[then(expr = "the dashboard notice should be {string}")]
async fn notice_is(world: &mut EduverseWorld, expected: String) {
    let state = world.controller().snapshot().await;
    assert_eq!(state.notice.as_deref(), Some(expected.as_str()));
}

#[then(expr = "the dashboard notice should mention {string}")]
async fn notice_mentions(world: &mut EduverseWorld, expected: String) {
    let notice = world
        .controller()
        .snapshot()
        .await
        .notice
        .expect("no notice shown");
    assert!(
        notice.contains(&expected),
        "notice '{}' does not mention '{}'",
        notice,
        expected
    );
}
