mod common;

use common::{ADMIN_PASS, ADMIN_USER, TempDb, temp_store};
use folio::BlogError;
use folio::db::{NewPost, OrderColumn, OrderDirection, PostEdit, QueryOptions};
use std::collections::BTreeSet;

fn names(tags: &[folio::db::Tag]) -> BTreeSet<String> {
    tags.iter().map(|t| t.name.clone()).collect()
}

fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn first_connect_seeds_a_single_admin() {
    let db = TempDb::new("seed");
    let storage = db.connect().await;
    assert!(storage.is_initialized().await.unwrap());

    let admin = storage
        .get_user_by_credentials(ADMIN_USER, ADMIN_PASS)
        .await
        .expect("seeded admin should log in");
    assert!(admin.is_admin);
    assert_ne!(admin.password, ADMIN_PASS, "password must be stored hashed");

    // reopening an existing store must not seed again
    drop(storage);
    let storage = db.connect().await;
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM user")
        .fetch_one(storage.pool())
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn wrong_credentials_are_unauthorized() {
    let (storage, _db) = temp_store("creds").await;
    let wrong_pass = storage.get_user_by_credentials(ADMIN_USER, "nope").await;
    assert!(matches!(wrong_pass, Err(BlogError::Unauthorized)));
    let wrong_user = storage.get_user_by_credentials("mallory", ADMIN_PASS).await;
    assert!(matches!(wrong_user, Err(BlogError::Unauthorized)));
}

#[tokio::test]
async fn created_post_reads_back_by_id_and_slug() {
    let (storage, _db) = temp_store("create").await;
    let new = NewPost::new(1, "Hello World", "hello-world", "<p>hi</p>");
    let id = storage.create_post(&new).await.unwrap();

    let post = storage.get_post(id).await.unwrap();
    assert_eq!(post.title, new.title);
    assert_eq!(post.slug, new.slug);
    assert_eq!(post.content, new.content);
    assert_eq!(post.published, new.published);
    assert_eq!(post.user_id, 1);
    assert_eq!(post.created_at, post.updated_at);

    let by_slug = storage.get_post_by_slug("hello-world").await.unwrap();
    assert_eq!(by_slug, post);
}

#[tokio::test]
async fn missing_post_is_not_found() {
    let (storage, _db) = temp_store("missing").await;
    assert!(matches!(
        storage.get_post(42).await,
        Err(BlogError::NotFound("post"))
    ));
    assert!(matches!(
        storage.get_post_by_slug("nope").await,
        Err(BlogError::NotFound("post"))
    ));
}

#[tokio::test]
async fn colliding_slug_resolves_to_newest_post() {
    let (storage, _db) = temp_store("slug-collision").await;
    storage
        .create_post(&NewPost::new(1, "First", "same", "one"))
        .await
        .unwrap();
    let newer = storage
        .create_post(&NewPost::new(1, "Second", "same", "two"))
        .await
        .unwrap();
    assert_eq!(storage.get_post_by_slug("same").await.unwrap().id, newer);
}

#[tokio::test]
async fn listing_is_newest_first_and_limited() {
    let (storage, _db) = temp_store("list").await;
    assert!(
        storage
            .get_all_posts(QueryOptions::default())
            .await
            .unwrap()
            .is_empty()
    );

    let mut ids = Vec::new();
    for i in 0..5 {
        let post = NewPost::new(1, format!("Post {i}"), format!("post-{i}"), "body");
        ids.push(storage.create_post(&post).await.unwrap());
    }

    let latest = storage
        .get_all_posts(QueryOptions::default().with_limit(3))
        .await
        .unwrap();
    let got: Vec<i64> = latest.iter().map(|p| p.id).collect();
    assert_eq!(got, vec![ids[4], ids[3], ids[2]]);

    let by_title = storage
        .get_all_posts(
            QueryOptions::unordered().with_order(OrderColumn::Title, OrderDirection::Asc),
        )
        .await
        .unwrap();
    assert_eq!(by_title.len(), 5);
    assert_eq!(by_title[0].title, "Post 0");
}

#[tokio::test]
async fn tags_round_trip_as_a_set() {
    let (storage, _db) = temp_store("tags").await;
    let id = storage
        .create_post(&NewPost::new(1, "Tagged", "tagged", "x"))
        .await
        .unwrap();
    storage
        .create_tags(id, &strings(&["web", "rust", "web", " ", "sqlite"]))
        .await
        .unwrap();

    let tags = storage.get_tags(id).await.unwrap();
    assert_eq!(tags.len(), 3, "repeated and blank names are not linked");
    assert_eq!(names(&tags), set(&["rust", "sqlite", "web"]));
}

#[tokio::test]
async fn existing_tags_are_reused_across_posts() {
    let (storage, _db) = temp_store("tag-reuse").await;
    let a = storage
        .create_post_with_tags(&NewPost::new(1, "A", "a", "x"), &strings(&["rust"]))
        .await
        .unwrap();
    let b = storage
        .create_post_with_tags(&NewPost::new(1, "B", "b", "x"), &strings(&["rust"]))
        .await
        .unwrap();

    let tag_a = storage.get_tags(a).await.unwrap();
    let tag_b = storage.get_tags(b).await.unwrap();
    assert_eq!(tag_a, tag_b);
    assert_eq!(storage.all_tags().await.unwrap().len(), 1);
}

#[tokio::test]
async fn delete_removes_post_and_only_orphaned_tags() {
    let (storage, _db) = temp_store("delete").await;
    let doomed = storage
        .create_post_with_tags(
            &NewPost::new(1, "Doomed", "doomed", "x"),
            &strings(&["rust", "web"]),
        )
        .await
        .unwrap();
    let survivor = storage
        .create_post_with_tags(
            &NewPost::new(1, "Survivor", "survivor", "x"),
            &strings(&["web"]),
        )
        .await
        .unwrap();

    storage.delete_post(doomed).await.unwrap();

    assert!(matches!(
        storage.get_post(doomed).await,
        Err(BlogError::NotFound(_))
    ));
    assert_eq!(names(&storage.all_tags().await.unwrap()), set(&["web"]));
    assert_eq!(names(&storage.get_tags(survivor).await.unwrap()), set(&["web"]));

    let (links,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM post_tags WHERE post_id = ?")
        .bind(doomed)
        .fetch_one(storage.pool())
        .await
        .unwrap();
    assert_eq!(links, 0);
}

#[tokio::test]
async fn deleting_missing_post_is_not_found() {
    let (storage, _db) = temp_store("delete-missing").await;
    assert!(matches!(
        storage.delete_post(99).await,
        Err(BlogError::NotFound("post"))
    ));
}

#[tokio::test]
async fn edit_updates_fields_and_signals_missing_ids() {
    let (storage, _db) = temp_store("edit").await;
    let id = storage
        .create_post(&NewPost::new(1, "Draft", "draft", "old"))
        .await
        .unwrap();
    let before = storage.get_post(id).await.unwrap();

    let edit = PostEdit {
        title: "Final".to_string(),
        slug: "final".to_string(),
        content: "new".to_string(),
        tags: None,
    };
    storage.edit_post(id, &edit).await.unwrap();

    let after = storage.get_post(id).await.unwrap();
    assert_eq!(after.title, "Final");
    assert_eq!(after.slug, "final");
    assert_eq!(after.content, "new");
    assert_eq!(after.created_at, before.created_at);
    assert!(after.updated_at >= before.updated_at);

    assert!(matches!(
        storage.edit_post(id + 100, &edit).await,
        Err(BlogError::NotFound("post"))
    ));
}

#[tokio::test]
async fn editing_tags_away_cleans_up_orphans() {
    let (storage, _db) = temp_store("edit-tags").await;
    let id = storage
        .create_post_with_tags(
            &NewPost::new(1, "Post", "post", "x"),
            &strings(&["old", "kept"]),
        )
        .await
        .unwrap();

    let edit = PostEdit {
        title: "Post".to_string(),
        slug: "post".to_string(),
        content: "x".to_string(),
        tags: Some(strings(&["kept", "fresh"])),
    };
    storage.edit_post(id, &edit).await.unwrap();

    assert_eq!(names(&storage.get_tags(id).await.unwrap()), set(&["fresh", "kept"]));
    assert_eq!(names(&storage.all_tags().await.unwrap()), set(&["fresh", "kept"]));
}

#[tokio::test]
async fn filtered_posts_match_any_tag() {
    let (storage, _db) = temp_store("filter").await;
    let rust = storage
        .create_post_with_tags(&NewPost::new(1, "R", "r", "x"), &strings(&["rust"]))
        .await
        .unwrap();
    let both = storage
        .create_post_with_tags(
            &NewPost::new(1, "RW", "rw", "x"),
            &strings(&["rust", "web"]),
        )
        .await
        .unwrap();
    storage
        .create_post_with_tags(&NewPost::new(1, "G", "g", "x"), &strings(&["go"]))
        .await
        .unwrap();

    let only_rust: Vec<i64> = storage
        .get_filtered_posts(&strings(&["rust"]), QueryOptions::default())
        .await
        .unwrap()
        .iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(only_rust, vec![both, rust]);

    let either = storage
        .get_filtered_posts(&strings(&["rust", "web"]), QueryOptions::default())
        .await
        .unwrap();
    assert_eq!(either.len(), 2, "a post with both tags appears once");

    assert!(
        storage
            .get_filtered_posts(&strings(&["haskell"]), QueryOptions::default())
            .await
            .unwrap()
            .is_empty()
    );
    let unfiltered = storage
        .get_filtered_posts(&[], QueryOptions::default())
        .await
        .unwrap();
    assert_eq!(unfiltered.len(), 3);
}

#[tokio::test]
async fn filtered_posts_follow_query_options() {
    let (storage, _db) = temp_store("filter-options").await;
    for title in ["Charlie", "Alpha", "Bravo"] {
        storage
            .create_post_with_tags(
                &NewPost::new(1, title, title.to_lowercase(), "x"),
                &strings(&["rust"]),
            )
            .await
            .unwrap();
    }

    let options = QueryOptions::unordered()
        .with_order(OrderColumn::Title, OrderDirection::Asc)
        .with_limit(2);
    let titles: Vec<String> = storage
        .get_filtered_posts(&strings(&["rust"]), options)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.title)
        .collect();
    assert_eq!(titles, vec!["Alpha", "Bravo"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_deletes_all_succeed() {
    let (storage, _db) = temp_store("concurrent-delete").await;
    let mut ids = Vec::new();
    for i in 0..30 {
        let post = NewPost::new(1, format!("Post {i}"), format!("post-{i}"), "x");
        let own = format!("own-{i}");
        let id = storage
            .create_post_with_tags(&post, &strings(&["shared", own.as_str()]))
            .await
            .unwrap();
        ids.push(id);
    }

    let handles: Vec<_> = ids
        .into_iter()
        .map(|id| {
            let storage = storage.clone();
            tokio::spawn(async move { storage.delete_post(id).await })
        })
        .collect();
    for handle in handles {
        handle
            .await
            .expect("delete task panicked")
            .expect("concurrent delete should succeed");
    }

    assert!(
        storage
            .get_all_posts(QueryOptions::default())
            .await
            .unwrap()
            .is_empty()
    );
    assert!(storage.all_tags().await.unwrap().is_empty());
}

#[tokio::test]
async fn failed_delete_rolls_back_links_and_tags() {
    let (storage, _db) = temp_store("delete-rollback").await;
    let id = storage
        .create_post_with_tags(
            &NewPost::new(1, "Pinned", "pinned", "x"),
            &strings(&["solo", "rust"]),
        )
        .await
        .unwrap();

    // the post row is deleted last, so this fails after links and orphans are gone
    sqlx::query(
        "CREATE TRIGGER pin_posts BEFORE DELETE ON post BEGIN SELECT RAISE(ABORT, 'pinned'); END",
    )
    .execute(storage.pool())
    .await
    .unwrap();

    assert!(matches!(
        storage.delete_post(id).await,
        Err(BlogError::DatabaseError(_))
    ));

    assert_eq!(storage.get_post(id).await.unwrap().slug, "pinned");
    assert_eq!(names(&storage.get_tags(id).await.unwrap()), set(&["rust", "solo"]));
    assert_eq!(names(&storage.all_tags().await.unwrap()), set(&["rust", "solo"]));
}

#[tokio::test]
async fn failed_tag_edit_rolls_back() {
    let (storage, _db) = temp_store("edit-rollback").await;
    let id = storage
        .create_post_with_tags(&NewPost::new(1, "Post", "post", "x"), &strings(&["old"]))
        .await
        .unwrap();

    sqlx::query(
        "CREATE TRIGGER no_new_tags BEFORE INSERT ON tag BEGIN SELECT RAISE(ABORT, 'frozen'); END",
    )
    .execute(storage.pool())
    .await
    .unwrap();

    let edit = PostEdit {
        title: "Renamed".to_string(),
        slug: "renamed".to_string(),
        content: "y".to_string(),
        tags: Some(strings(&["fresh"])),
    };
    assert!(matches!(
        storage.edit_post(id, &edit).await,
        Err(BlogError::DatabaseError(_))
    ));

    let post = storage.get_post(id).await.unwrap();
    assert_eq!(post.title, "Post");
    assert_eq!(post.content, "x");
    assert_eq!(names(&storage.get_tags(id).await.unwrap()), set(&["old"]));
}
