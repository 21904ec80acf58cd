//! CRUD coverage for the owner-scoped registries (friends, categories,
//! groups) and user provisioning.

use sea_orm::Database;

use engine::{Engine, EngineError};
use migration::MigratorTrait;

async fn engine_with_db() -> Engine {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Engine::builder().database(db).build().await.unwrap()
}

#[tokio::test]
async fn duplicate_user_email_is_rejected() {
    let engine = engine_with_db().await;
    engine
        .create_user("alice@example.com", "Alice", "password")
        .await
        .unwrap();

    let err = engine
        .create_user("ALICE@example.com", "Alice Again", "password")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    assert_eq!(engine.list_users().await.unwrap().len(), 1);
}

#[tokio::test]
async fn friend_crud_roundtrip() {
    let engine = engine_with_db().await;
    let alice = engine
        .create_user("alice@example.com", "Alice", "password")
        .await
        .unwrap();

    let friend = engine
        .create_friend(alice.id, "  Marco ", Some("college roommate"))
        .await
        .unwrap();
    assert_eq!(friend.name, "Marco");

    let fetched = engine.friend(alice.id, friend.id).await.unwrap();
    assert_eq!(fetched, friend);

    let renamed = engine
        .update_friend(alice.id, friend.id, Some("Marco B."), Some(None))
        .await
        .unwrap();
    assert_eq!(renamed.name, "Marco B.");
    assert_eq!(renamed.notes, None);

    engine.delete_friend(alice.id, friend.id).await.unwrap();
    let err = engine.friend(alice.id, friend.id).await.unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn friends_are_owner_scoped_and_filterable() {
    let engine = engine_with_db().await;
    let alice = engine
        .create_user("alice@example.com", "Alice", "password")
        .await
        .unwrap();
    let bob = engine
        .create_user("bob@example.com", "Bob", "password")
        .await
        .unwrap();

    for name in ["Marco", "Maria", "John"] {
        engine.create_friend(alice.id, name, None).await.unwrap();
    }
    engine.create_friend(bob.id, "Marcos", None).await.unwrap();

    let all = engine.list_friends(alice.id, None, 1, 20).await.unwrap();
    assert_eq!(all.total, 3);

    let marias = engine
        .list_friends(alice.id, Some("Mar"), 1, 20)
        .await
        .unwrap();
    assert_eq!(marias.total, 2);

    // Bob cannot read Alice's friend.
    let marco = all.items.iter().find(|f| f.name == "Marco").unwrap();
    let err = engine.friend(bob.id, marco.id).await.unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn category_names_are_unique_per_owner() {
    let engine = engine_with_db().await;
    let alice = engine
        .create_user("alice@example.com", "Alice", "password")
        .await
        .unwrap();
    let bob = engine
        .create_user("bob@example.com", "Bob", "password")
        .await
        .unwrap();

    engine
        .create_category(alice.id, "Food", Some("#ff0000"))
        .await
        .unwrap();
    let err = engine
        .create_category(alice.id, "Food", None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    // A different owner may reuse the name.
    engine.create_category(bob.id, "Food", None).await.unwrap();
}

#[tokio::test]
async fn category_rename_cannot_collide() {
    let engine = engine_with_db().await;
    let alice = engine
        .create_user("alice@example.com", "Alice", "password")
        .await
        .unwrap();

    engine.create_category(alice.id, "Food", None).await.unwrap();
    let travel = engine
        .create_category(alice.id, "Travel", None)
        .await
        .unwrap();

    let err = engine
        .update_category(alice.id, travel.id, Some("Food"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    // Saving the unchanged name back is not a collision.
    let same = engine
        .update_category(alice.id, travel.id, Some("Travel"), Some(Some("#00ff00")))
        .await
        .unwrap();
    assert_eq!(same.name, "Travel");
    assert_eq!(same.color.as_deref(), Some("#00ff00"));
}

#[tokio::test]
async fn empty_names_are_rejected() {
    let engine = engine_with_db().await;
    let alice = engine
        .create_user("alice@example.com", "Alice", "password")
        .await
        .unwrap();

    let err = engine.create_friend(alice.id, "   ", None).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidName(_)));

    let err = engine.create_category(alice.id, "", None).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidName(_)));
}

#[tokio::test]
async fn group_crud_roundtrip() {
    let engine = engine_with_db().await;
    let alice = engine
        .create_user("alice@example.com", "Alice", "password")
        .await
        .unwrap();

    let group = engine
        .create_group(alice.id, "Ski trip", Some("February 2026"))
        .await
        .unwrap();

    let err = engine
        .create_group(alice.id, "Ski trip", None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    let updated = engine
        .update_group(alice.id, group.id, None, Some(None))
        .await
        .unwrap();
    assert_eq!(updated.description, None);

    engine.delete_group(alice.id, group.id).await.unwrap();
    assert_eq!(
        engine.list_groups(alice.id, None, 1, 20).await.unwrap().total,
        0
    );
}
