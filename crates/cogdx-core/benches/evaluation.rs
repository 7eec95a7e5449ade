use criterion::{black_box, criterion_group, criterion_main, Criterion};

use cogdx_core::calibration::analyze_calibration;
use cogdx_core::config::EngineConfig;
use cogdx_core::model::{Confidence, QMatrix, QMatrixEntry, StudentResponse, Telemetry};
use cogdx_core::{calculate_remediation_plan, SessionEvaluator};

fn make_q_matrix(questions: usize, competencies: usize) -> QMatrix {
    QMatrix::new((0..questions).map(|i| QMatrixEntry {
        id: format!("q{i}"),
        competency_id: format!("c{}", i % competencies),
        is_trap: i % 3 == 0,
        trap_option_id: Some(format!("q{i}-b")),
        misconception_id: Some(format!("m{}", i % competencies)),
        dont_know_option_id: Some(format!("q{i}-idk")),
        remedial_content_ids: vec![format!("r{}", i % competencies)],
    }))
}

fn make_responses(n: usize) -> Vec<StudentResponse> {
    (0..n)
        .map(|i| {
            let option = match i % 5 {
                0 => "b",
                1 => "idk",
                _ => "a",
            };
            StudentResponse {
                question_id: format!("q{i}"),
                selected_option_id: Some(format!("q{i}-{option}")),
                is_correct: option == "a",
                confidence: Confidence::ALL[i % 4],
                telemetry: Telemetry {
                    time_ms: 500 + (i as u64 * 997) % 20_000,
                    hesitation_count: (i % 4) as u32,
                    expected_time_ms: Some(12_000),
                    revisit_count: Some((i % 3) as u32),
                    ..Default::default()
                },
            }
        })
        .collect()
}

fn bench_calibration(c: &mut Criterion) {
    let mut group = c.benchmark_group("calibration");
    let config = EngineConfig::default();

    for n in [20, 200] {
        let responses = make_responses(n);
        group.bench_function(format!("responses={n}"), |b| {
            b.iter(|| analyze_calibration(black_box(&responses), &config))
        });
    }

    group.finish();
}

fn bench_evaluate_session(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate_session");
    let evaluator = SessionEvaluator::default();

    for (n, competencies) in [(20, 5), (200, 40)] {
        let q_matrix = make_q_matrix(n, competencies);
        let responses = make_responses(n);
        group.bench_function(format!("responses={n},competencies={competencies}"), |b| {
            b.iter(|| {
                let result = evaluator.evaluate_session(
                    "bench",
                    "learner",
                    black_box(&responses),
                    &q_matrix,
                    None,
                );
                calculate_remediation_plan(&result)
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_calibration, bench_evaluate_session);
criterion_main!(benches);
