use std::time::Duration;

use jiff::Timestamp;
use lynx_core::{LinkChanges, LinkRepository, NewLink, ShortCode, StorageError, UserId};
use lynx_storage::MySqlRepository;
use lynx_test_infra::mysql::{MySqlServer, MysqlConfig};
use sqlx::mysql::MySqlPoolOptions;

struct Fixture {
    _mysql: MySqlServer,
    repo: MySqlRepository,
}

impl Fixture {
    async fn start() -> Self {
        let mysql = MySqlServer::new(MysqlConfig::builder().build())
            .await
            .expect("start mysql");
        let url = mysql.database_url().await.expect("mysql url");
        let pool = connect_with_retry(&url).await;

        sqlx::query(include_str!("../ddl/mysql/links.sql"))
            .execute(&pool)
            .await
            .expect("create schema");

        Self {
            _mysql: mysql,
            repo: MySqlRepository::new(pool),
        }
    }
}

async fn connect_with_retry(url: &str) -> sqlx::MySqlPool {
    let mut last_error = None;

    for _ in 0..20 {
        match MySqlPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
        {
            Ok(pool) => return pool,
            Err(err) => {
                last_error = Some(err);
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
        }
    }

    panic!("failed to connect mysql: {last_error:?}");
}

fn code(value: &str) -> ShortCode {
    ShortCode::new_unchecked(value)
}

fn new_link(url: &str, code: &str) -> NewLink {
    NewLink {
        original_url: url.to_string(),
        short_code: ShortCode::new_unchecked(code),
        custom_alias: None,
        expires_at: None,
        owner_id: None,
    }
}

#[tokio::test]
#[ignore = "requires a local Docker daemon"]
async fn insert_and_get_round_trip() {
    let fixture = Fixture::start().await;
    let expiry = Timestamp::from_second(Timestamp::now().as_second() + 600).unwrap();

    let inserted = fixture
        .repo
        .insert(NewLink {
            original_url: "https://example.com".to_string(),
            short_code: code("abc123"),
            custom_alias: Some("abc123".to_string()),
            expires_at: Some(expiry),
            owner_id: Some(UserId::new(7)),
        })
        .await
        .unwrap();

    let got = fixture
        .repo
        .get_by_short_code(&code("abc123"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(got.id, inserted.id);
    assert_eq!(got.original_url, "https://example.com");
    assert_eq!(got.custom_alias.as_deref(), Some("abc123"));
    assert_eq!(got.expires_at, Some(expiry));
    assert_eq!(got.last_accessed_at, None);
    assert_eq!(got.access_count, 0);
    assert_eq!(got.owner_id, Some(UserId::new(7)));
}

#[tokio::test]
#[ignore = "requires a local Docker daemon"]
async fn insert_conflicts_when_code_already_exists() {
    let fixture = Fixture::start().await;

    fixture
        .repo
        .insert(new_link("https://one.example", "abc123"))
        .await
        .unwrap();

    let err = fixture
        .repo
        .insert(new_link("https://two.example", "abc123"))
        .await
        .unwrap_err();

    assert!(matches!(err, StorageError::Conflict(_)));
}

#[tokio::test]
#[ignore = "requires a local Docker daemon"]
async fn concurrent_increments_do_not_lose_updates() {
    let fixture = Fixture::start().await;

    fixture
        .repo
        .insert(new_link("https://example.com", "abc123"))
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..20 {
        let repo = fixture.repo.clone();
        handles.push(tokio::spawn(async move {
            repo.increment_access(&ShortCode::new_unchecked("abc123"), Timestamp::now())
                .await
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().unwrap());
    }

    let got = fixture
        .repo
        .get_by_short_code(&code("abc123"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(got.access_count, 20);
    assert!(got.last_accessed_at.is_some());
}

#[tokio::test]
#[ignore = "requires a local Docker daemon"]
async fn concurrent_partial_updates_keep_both_fields() {
    let fixture = Fixture::start().await;
    let expiry = Timestamp::from_second(Timestamp::now().as_second() + 600).unwrap();

    // Two writers racing on disjoint fields must both land: the writer
    // that only sets the expiry must not carry a stale original_url
    // over the other writer's commit.
    for round in 0..10 {
        let short = format!("race{round:02}");
        fixture
            .repo
            .insert(new_link("https://old.example", &short))
            .await
            .unwrap();

        let repo_a = fixture.repo.clone();
        let repo_b = fixture.repo.clone();
        let code_a = ShortCode::new_unchecked(short.clone());
        let code_b = ShortCode::new_unchecked(short.clone());

        let url_update = tokio::spawn(async move {
            repo_a
                .update(
                    &code_a,
                    LinkChanges {
                        original_url: Some("https://new.example".to_string()),
                        expires_at: None,
                    },
                )
                .await
        });
        let expiry_update = tokio::spawn(async move {
            repo_b
                .update(
                    &code_b,
                    LinkChanges {
                        original_url: None,
                        expires_at: Some(Some(expiry)),
                    },
                )
                .await
        });

        url_update.await.unwrap().unwrap();
        expiry_update.await.unwrap().unwrap();

        let got = fixture
            .repo
            .get_by_short_code(&ShortCode::new_unchecked(short))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(got.original_url, "https://new.example");
        assert_eq!(got.expires_at, Some(expiry));
    }
}

#[tokio::test]
#[ignore = "requires a local Docker daemon"]
async fn update_on_missing_code_returns_none() {
    let fixture = Fixture::start().await;

    let updated = fixture
        .repo
        .update(
            &code("nope"),
            LinkChanges {
                original_url: Some("https://example.com".to_string()),
                expires_at: None,
            },
        )
        .await
        .unwrap();

    assert!(updated.is_none());
}

#[tokio::test]
#[ignore = "requires a local Docker daemon"]
async fn update_after_delete_returns_none() {
    let fixture = Fixture::start().await;

    fixture
        .repo
        .insert(new_link("https://example.com", "abc123"))
        .await
        .unwrap();
    assert!(fixture.repo.delete(&code("abc123")).await.unwrap());

    let updated = fixture
        .repo
        .update(
            &code("abc123"),
            LinkChanges {
                original_url: Some("https://elsewhere.example".to_string()),
                expires_at: None,
            },
        )
        .await
        .unwrap();

    assert!(updated.is_none());
    assert!(!fixture.repo.exists(&code("abc123")).await.unwrap());
}

#[tokio::test]
#[ignore = "requires a local Docker daemon"]
async fn negative_access_count_is_invalid_data() {
    let fixture = Fixture::start().await;

    fixture
        .repo
        .insert(new_link("https://example.com", "abc123"))
        .await
        .unwrap();

    sqlx::query("UPDATE links SET access_count = -1 WHERE short_code = ?")
        .bind("abc123")
        .execute(fixture.repo.pool())
        .await
        .unwrap();

    let err = fixture
        .repo
        .get_by_short_code(&code("abc123"))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::InvalidData(_)));
}

#[tokio::test]
#[ignore = "requires a local Docker daemon"]
async fn get_by_original_url_scopes_to_owner() {
    let fixture = Fixture::start().await;

    let mut mine = new_link("https://example.com", "mine01");
    mine.owner_id = Some(UserId::new(1));
    fixture.repo.insert(mine).await.unwrap();

    let found = fixture
        .repo
        .get_by_original_url("https://example.com", Some(UserId::new(1)))
        .await
        .unwrap();
    assert!(found.is_some());

    let other = fixture
        .repo
        .get_by_original_url("https://example.com", Some(UserId::new(2)))
        .await
        .unwrap();
    assert!(other.is_none());
}
