use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;

use jsonwebtoken::Algorithm;
use service::auth::domain::LoginAttempt;
use service::auth::repository::mock::{credential, InMemoryLoginLogStore, InMemoryUserStore};
use service::auth::{password, LoginPipeline, TokenService};

fn bench_login(c: &mut Criterion) {
    let users = Arc::new(InMemoryUserStore::default());
    let hash = password::hash_password("Benchmark1").expect("hash");
    users.insert(credential("bench", &hash, true));

    let pipeline = LoginPipeline::new(
        users,
        Arc::new(InMemoryLoginLogStore::default()),
        Arc::new(TokenService::new("secret", Algorithm::HS256, 60)),
    );

    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("login_pipeline_verify", |b| {
        b.iter(|| {
            let outcome = rt
                .block_on(pipeline.attempt_login(LoginAttempt {
                    username: "bench".into(),
                    password: "Benchmark1".into(),
                    ip_address: None,
                    user_agent: None,
                }))
                .unwrap();
            black_box(outcome);
        });
    });
}

criterion_group!(benches, bench_login);
criterion_main!(benches);
