use smartdial::index::source::{ContactFile, DeletedContact, JsonContactSource};
use smartdial::matching::{NamePrefixGenerator, NameQueryMatcher};
use smartdial::models::MatchPosition;
use smartdial::{
    AppConfig, Contact, DatabaseConfig, IndexerConfig, MatchIndex, MatcherConfig, ScriptFamily,
};

fn contact(id: i64, name: &str, numbers: &[&str]) -> Contact {
    Contact {
        id,
        display_name: (!name.is_empty()).then(|| name.to_string()),
        numbers: numbers.iter().map(|n| n.to_string()).collect(),
        lookup_key: Some(format!("key-{id}")),
        photo_id: None,
        starred: false,
        is_super_primary: false,
        is_primary: false,
        in_visible_group: false,
        last_time_used: 0,
        times_used: 0,
        last_updated: 1_000,
    }
}

fn nanp_config(path: &str) -> AppConfig {
    AppConfig {
        database: DatabaseConfig { path: path.into() },
        matcher: MatcherConfig {
            nanp: true,
            script: ScriptFamily::Latin,
            match_empty_query: false,
        },
        indexer: IndexerConfig::default(),
    }
}

fn fixture_contacts() -> Vec<Contact> {
    vec![
        contact(1, "Albert Ben Charles Daniel Ed Foster", &["+1-510-555-1234"]),
        contact(2, "Fred Smith", &["650-555-0000"]),
        contact(3, "Alice Mary Tom Walter Ruth Sam", &[]),
    ]
}

async fn fixture_index() -> MatchIndex {
    let index = MatchIndex::open(&nanp_config(":memory:")).await.unwrap();
    let source = JsonContactSource::from_contacts(fixture_contacts());
    index.start_update(&source, false).await.unwrap();
    index
}

#[tokio::test]
async fn test_lookup_by_name_prefix() {
    let index = fixture_index().await;

    let hits = index.lookup("3733", 10).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].contact_id, 2);
    assert_eq!(hits[0].name_positions, vec![MatchPosition::new(0, 4)]);
    assert_eq!(hits[0].lookup_key.as_deref(), Some("key-2"));
}

#[tokio::test]
async fn test_lookup_by_initials() {
    let index = fixture_index().await;

    // "2233" reaches contact 1 through the A+B initials combination.
    let hits = index.lookup("2233", 10).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].contact_id, 1);
    assert!(!hits[0].name_positions.is_empty());

    // "2677" spells A+M+R+S against contact 3.
    let hits = index.lookup("2677", 10).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].contact_id, 3);
    assert_eq!(
        hits[0].name_positions,
        vec![
            MatchPosition::new(0, 1),
            MatchPosition::new(6, 7),
            MatchPosition::new(22, 23),
            MatchPosition::new(27, 28),
        ]
    );
}

#[tokio::test]
async fn test_middle_initials_are_not_indexed() {
    let index = fixture_index().await;

    // Tom and Walter are middle tokens of contact 3; "87" (t=8, w=9 would
    // be "9...") must not reach anything.
    assert!(index.lookup("87", 10).await.unwrap().is_empty());
    assert!(index.lookup("9", 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_lookup_by_number() {
    let index = fixture_index().await;

    let hits = index.lookup("510", 10).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].contact_id, 1);
    assert_eq!(hits[0].matched_number.as_deref(), Some("+1-510-555-1234"));
    // The match starts past "+1-".
    assert_eq!(hits[0].number_position, Some(MatchPosition::new(3, 6)));

    // Local part, past the area code.
    let hits = index.lookup("5551234", 10).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].contact_id, 1);
}

#[tokio::test]
async fn test_empty_query_policy() {
    let index = fixture_index().await;
    assert!(index.lookup("", 10).await.unwrap().is_empty());

    let mut config = nanp_config(":memory:");
    config.matcher.match_empty_query = true;
    let index = MatchIndex::open(&config).await.unwrap();
    let source = JsonContactSource::from_contacts(fixture_contacts());
    index.start_update(&source, false).await.unwrap();

    let hits = index.lookup("", 10).await.unwrap();
    assert_eq!(hits.len(), 3);
    assert!(hits
        .iter()
        .all(|h| h.name_positions == vec![MatchPosition::new(0, 0)]));
}

#[tokio::test]
async fn test_ranking_order() {
    let index = MatchIndex::open(&nanp_config(":memory:")).await.unwrap();
    let mut starred = contact(10, "Dana Adams", &[]);
    starred.starred = true;
    let mut frequent = contact(11, "Dane Brown", &[]);
    frequent.times_used = 50;
    let plain = contact(12, "Dan Carter", &[]);
    let source = JsonContactSource::from_contacts(vec![plain, frequent, starred]);
    index.start_update(&source, false).await.unwrap();

    // All three match "326" ("dan"); starred first, then by use count.
    let ids: Vec<i64> = index
        .lookup("326", 10)
        .await
        .unwrap()
        .iter()
        .map(|h| h.contact_id)
        .collect();
    assert_eq!(ids, vec![10, 11, 12]);

    let ids: Vec<i64> = index
        .lookup("326", 2)
        .await
        .unwrap()
        .iter()
        .map(|h| h.contact_id)
        .collect();
    assert_eq!(ids, vec![10, 11], "limit truncates after ranking");
}

#[tokio::test]
async fn test_reindex_is_idempotent() {
    let index = fixture_index().await;
    let fred = contact(2, "Fred Smith", &["650-555-0000"]);
    index.reindex(&fred).await.unwrap();
    index.reindex(&fred).await.unwrap();

    let hits = index.lookup("3733", 10).await.unwrap();
    assert_eq!(hits.len(), 1, "reindexing must not duplicate candidates");
}

#[tokio::test]
async fn test_reindex_renamed_contact() {
    let index = fixture_index().await;
    let renamed = contact(2, "George Smith", &["650-555-0000"]);
    index.reindex(&renamed).await.unwrap();

    assert!(index.lookup("3733", 10).await.unwrap().is_empty());
    let hits = index.lookup("4367", 10).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].display_name.as_deref(), Some("George Smith"));
}

#[tokio::test]
async fn test_incremental_sync_and_deletion() {
    let index = fixture_index().await;
    let future = chrono::Utc::now().timestamp_millis() + 60_000;

    let second_feed = JsonContactSource::new(ContactFile {
        contacts: Vec::new(),
        deleted: vec![DeletedContact {
            id: 2,
            deleted_at: future,
        }],
    });
    let summary = index.start_update(&second_feed, false).await.unwrap();
    assert_eq!(summary.indexed, 0);
    assert_eq!(summary.removed, 1);

    assert!(index.lookup("3733", 10).await.unwrap().is_empty());
    assert_eq!(index.lookup("2233", 10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_force_full_resync() {
    let index = fixture_index().await;

    // Nothing new since the first sync.
    let source = JsonContactSource::from_contacts(fixture_contacts());
    let summary = index.start_update(&source, false).await.unwrap();
    assert_eq!(summary.indexed, 0);

    let summary = index.start_update(&source, true).await.unwrap();
    assert_eq!(summary.indexed, 3);
    assert_eq!(index.lookup("3733", 10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_interrupted_sync_rows_are_purged() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dial.db").to_string_lossy().into_owned();
    let config = nanp_config(&path);

    let index = MatchIndex::open(&config).await.unwrap();
    let source = JsonContactSource::from_contacts(fixture_contacts());
    index.start_update(&source, false).await.unwrap();

    // Simulate a sync that died after committing one contact: rows
    // stamped after the committed watermark.
    let pool = smartdial::db::make_pool(&config.database).await.unwrap();
    let future = chrono::Utc::now().timestamp_millis() + 60_000;
    sqlx::query(
        "INSERT INTO candidate (contact_id, display_name, number, indexed_at) \
         VALUES (999, 'Ghost Contact', NULL, ?)",
    )
    .bind(future)
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query("INSERT INTO prefix (contact_id, prefix) VALUES (999, '44678')")
        .execute(&pool)
        .await
        .unwrap();
    drop(pool);

    let index = MatchIndex::open(&config).await.unwrap();
    assert_eq!(index.lookup("44678", 10).await.unwrap().len(), 1);

    let summary = index
        .start_update(&JsonContactSource::from_contacts(Vec::new()), false)
        .await
        .unwrap();
    assert_eq!(summary.purged, 1);

    assert!(index.lookup("44678", 10).await.unwrap().is_empty());
    assert_eq!(index.lookup("3733", 10).await.unwrap().len(), 1, "committed contacts survive");
}

#[tokio::test]
async fn test_contact_without_name_is_reachable_by_number() {
    let index = MatchIndex::open(&nanp_config(":memory:")).await.unwrap();
    let source = JsonContactSource::from_contacts(vec![contact(5, "", &["(415) 555-2671"])]);
    let summary = index.start_update(&source, false).await.unwrap();
    assert_eq!(summary.indexed, 1);

    let hits = index.lookup("415", 10).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].display_name, None);
    assert_eq!(hits[0].matched_number.as_deref(), Some("(415) 555-2671"));
}

#[test]
fn test_every_generated_prefix_revalidates_through_matcher() {
    let config = smartdial::MatcherConfig::default();
    let generator = NamePrefixGenerator::new(config.script.character_map());
    // Names with colliding initial digits, hyphens, apostrophes, and
    // long initials windows.
    let names = [
        "Fred Smith",
        "Albert Ben Charles Daniel Ed Foster",
        "Alice Mary Tom Walter Ruth Sam",
        "Jo O'Brien",
        "Mary-Jane Kelly",
        "John Fitzgerald Kennedy",
    ];
    for name in names {
        for stored in generator.prefixes(name) {
            for end in 1..=stored.len() {
                let query = &stored[..end];
                let matcher = NameQueryMatcher::new(query, &config);
                assert!(
                    matcher.match_name(name).is_some(),
                    "query {query} (from stored {stored}) failed against {name}"
                );
            }
        }
    }
}

#[tokio::test]
async fn test_contact_with_nothing_to_index_is_skipped() {
    let index = MatchIndex::open(&nanp_config(":memory:")).await.unwrap();
    let source = JsonContactSource::from_contacts(vec![contact(6, "", &[]), contact(7, "Ann", &[])]);
    let summary = index.start_update(&source, false).await.unwrap();
    assert_eq!(summary.indexed, 1);
    assert_eq!(summary.skipped, 1);
}
