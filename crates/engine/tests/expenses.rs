use chrono::NaiveDate;
use sea_orm::Database;

use engine::{
    Engine, EngineError, ExpenseCreateCmd, ExpenseUpdateCmd, ExpenseListFilter, MoneyCents,
    ParticipantRef, Percent, SplitError, SplitLine, SplitStrategy,
};
use migration::MigratorTrait;

async fn engine_with_db() -> Engine {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Engine::builder().database(db).build().await.unwrap()
}

fn day(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

#[tokio::test]
async fn amount_split_persists_shares_in_order() {
    let engine = engine_with_db().await;
    let alice = engine
        .create_user("alice@example.com", "Alice", "password")
        .await
        .unwrap();

    let expense = engine
        .create_expense(
            ExpenseCreateCmd::new(
                alice.id,
                "Dinner",
                100_00,
                day("2026-02-11"),
                SplitStrategy::Amount,
            )
            .line(SplitLine::user(alice.id).amount(MoneyCents::new(60_00)))
            .line(SplitLine::user(alice.id).amount(MoneyCents::new(40_00))),
        )
        .await
        .unwrap();

    assert_eq!(expense.amount, MoneyCents::new(100_00));
    assert_eq!(expense.currency, "BRL");
    assert_eq!(expense.shares.len(), 2);
    assert_eq!(expense.shares[0].amount, MoneyCents::new(60_00));
    assert_eq!(expense.shares[1].amount, MoneyCents::new(40_00));
    assert!(expense.shares.iter().all(|s| s.percent.is_none()));

    // Reads come back in the same order.
    let fetched = engine.expense(alice.id, expense.id).await.unwrap();
    assert_eq!(fetched.shares, expense.shares);
}

#[tokio::test]
async fn percentage_split_rounds_and_absorbs_residual() {
    let engine = engine_with_db().await;
    let alice = engine
        .create_user("alice@example.com", "Alice", "password")
        .await
        .unwrap();
    let friend = engine
        .create_friend(alice.id, "Marco", None)
        .await
        .unwrap();

    let expense = engine
        .create_expense(
            ExpenseCreateCmd::new(
                alice.id,
                "Groceries",
                100_00,
                day("2026-02-11"),
                SplitStrategy::Percentage,
            )
            .line(SplitLine::user(alice.id).percent(Percent::from_e4(33_3333)))
            .line(SplitLine::user(alice.id).percent(Percent::from_e4(33_3333)))
            .line(SplitLine::friend(friend.id).percent(Percent::from_e4(33_3334))),
        )
        .await
        .unwrap();

    let amounts: Vec<i64> = expense.shares.iter().map(|s| s.amount.cents()).collect();
    assert_eq!(amounts, vec![33_33, 33_33, 33_34]);
    assert_eq!(expense.shares[2].participant, ParticipantRef::Friend(friend.id));
    assert_eq!(expense.shares[2].percent, Some(Percent::from_e4(33_3334)));

    let sum: i64 = amounts.iter().sum();
    assert_eq!(sum, expense.amount.cents());
}

#[tokio::test]
async fn amount_mismatch_is_rejected() {
    let engine = engine_with_db().await;
    let alice = engine
        .create_user("alice@example.com", "Alice", "password")
        .await
        .unwrap();

    let err = engine
        .create_expense(
            ExpenseCreateCmd::new(
                alice.id,
                "Dinner",
                100_00,
                day("2026-02-11"),
                SplitStrategy::Amount,
            )
            .line(SplitLine::user(alice.id).amount(MoneyCents::new(30_00)))
            .line(SplitLine::user(alice.id).amount(MoneyCents::new(40_00))),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        EngineError::Split(SplitError::AmountMismatch { .. })
    ));
}

#[tokio::test]
async fn empty_split_is_rejected() {
    let engine = engine_with_db().await;
    let alice = engine
        .create_user("alice@example.com", "Alice", "password")
        .await
        .unwrap();

    let err = engine
        .create_expense(ExpenseCreateCmd::new(
            alice.id,
            "Dinner",
            100_00,
            day("2026-02-11"),
            SplitStrategy::Amount,
        ))
        .await
        .unwrap_err();

    assert_eq!(err, EngineError::Split(SplitError::EmptySplit));
}

#[tokio::test]
async fn foreign_friend_is_rejected() {
    let engine = engine_with_db().await;
    let alice = engine
        .create_user("alice@example.com", "Alice", "password")
        .await
        .unwrap();
    let bob = engine
        .create_user("bob@example.com", "Bob", "password")
        .await
        .unwrap();
    let bobs_friend = engine.create_friend(bob.id, "Marco", None).await.unwrap();

    let err = engine
        .create_expense(
            ExpenseCreateCmd::new(
                alice.id,
                "Dinner",
                100_00,
                day("2026-02-11"),
                SplitStrategy::Amount,
            )
            .line(SplitLine::friend(bobs_friend.id).amount(MoneyCents::new(100_00))),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        EngineError::Split(SplitError::InvalidParticipant(_))
    ));
}

#[tokio::test]
async fn unknown_category_reference_is_rejected() {
    let engine = engine_with_db().await;
    let alice = engine
        .create_user("alice@example.com", "Alice", "password")
        .await
        .unwrap();

    let err = engine
        .create_expense(
            ExpenseCreateCmd::new(
                alice.id,
                "Dinner",
                100_00,
                day("2026-02-11"),
                SplitStrategy::Amount,
            )
            .category_id(uuid::Uuid::new_v4())
            .line(SplitLine::user(alice.id).amount(MoneyCents::new(100_00))),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::InvalidReference(_)));
}

#[tokio::test]
async fn update_replaces_split_set_wholesale() {
    let engine = engine_with_db().await;
    let alice = engine
        .create_user("alice@example.com", "Alice", "password")
        .await
        .unwrap();

    let expense = engine
        .create_expense(
            ExpenseCreateCmd::new(
                alice.id,
                "Road trip fuel",
                100_00,
                day("2026-02-11"),
                SplitStrategy::Amount,
            )
            .line(SplitLine::user(alice.id).amount(MoneyCents::new(60_00)))
            .line(SplitLine::user(alice.id).amount(MoneyCents::new(40_00))),
        )
        .await
        .unwrap();
    let old_ids: Vec<_> = expense.shares.iter().map(|s| s.id).collect();

    let updated = engine
        .update_expense(
            ExpenseUpdateCmd::new(alice.id, expense.id)
                .amount_minor(90_00)
                .strategy(SplitStrategy::Percentage)
                .lines(vec![
                    SplitLine::user(alice.id).percent(Percent::from_e4(50_0000)),
                    SplitLine::user(alice.id).percent(Percent::from_e4(25_0000)),
                    SplitLine::user(alice.id).percent(Percent::from_e4(25_0000)),
                ]),
        )
        .await
        .unwrap();

    assert_eq!(updated.amount, MoneyCents::new(90_00));
    assert_eq!(updated.strategy, SplitStrategy::Percentage);
    assert_eq!(updated.shares.len(), 3);
    let amounts: Vec<i64> = updated.shares.iter().map(|s| s.amount.cents()).collect();
    assert_eq!(amounts, vec![45_00, 22_50, 22_50]);
    // All rows were recreated, none mutated in place.
    assert!(updated.shares.iter().all(|s| !old_ids.contains(&s.id)));
}

#[tokio::test]
async fn scalar_update_keeps_existing_shares() {
    let engine = engine_with_db().await;
    let alice = engine
        .create_user("alice@example.com", "Alice", "password")
        .await
        .unwrap();

    let expense = engine
        .create_expense(
            ExpenseCreateCmd::new(
                alice.id,
                "Dinner",
                100_00,
                day("2026-02-11"),
                SplitStrategy::Amount,
            )
            .line(SplitLine::user(alice.id).amount(MoneyCents::new(100_00))),
        )
        .await
        .unwrap();

    let updated = engine
        .update_expense(
            ExpenseUpdateCmd::new(alice.id, expense.id).description("Late dinner"),
        )
        .await
        .unwrap();

    assert_eq!(updated.description, "Late dinner");
    assert_eq!(updated.shares, expense.shares);
}

#[tokio::test]
async fn update_validates_new_lines_against_effective_amount() {
    let engine = engine_with_db().await;
    let alice = engine
        .create_user("alice@example.com", "Alice", "password")
        .await
        .unwrap();

    let expense = engine
        .create_expense(
            ExpenseCreateCmd::new(
                alice.id,
                "Dinner",
                100_00,
                day("2026-02-11"),
                SplitStrategy::Amount,
            )
            .line(SplitLine::user(alice.id).amount(MoneyCents::new(100_00))),
        )
        .await
        .unwrap();

    // New lines still sum to the old amount, but the update changes it.
    let err = engine
        .update_expense(
            ExpenseUpdateCmd::new(alice.id, expense.id)
                .amount_minor(80_00)
                .lines(vec![
                    SplitLine::user(alice.id).amount(MoneyCents::new(100_00)),
                ]),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Split(SplitError::AmountMismatch { .. })
    ));

    // Nothing was committed: the stored expense is unchanged.
    let stored = engine.expense(alice.id, expense.id).await.unwrap();
    assert_eq!(stored.amount, MoneyCents::new(100_00));
    assert_eq!(stored.shares, expense.shares);
}

#[tokio::test]
async fn list_expenses_filters_and_paginates() {
    let engine = engine_with_db().await;
    let alice = engine
        .create_user("alice@example.com", "Alice", "password")
        .await
        .unwrap();
    let food = engine.create_category(alice.id, "Food", None).await.unwrap();

    for (description, date, category) in [
        ("Dinner downtown", "2026-02-10", Some(food.id)),
        ("Groceries", "2026-02-11", Some(food.id)),
        ("Taxi", "2026-02-12", None),
    ] {
        let mut cmd = ExpenseCreateCmd::new(
            alice.id,
            description,
            50_00,
            day(date),
            SplitStrategy::Amount,
        )
        .line(SplitLine::user(alice.id).amount(MoneyCents::new(50_00)));
        if let Some(category_id) = category {
            cmd = cmd.category_id(category_id);
        }
        engine.create_expense(cmd).await.unwrap();
    }

    let all = engine
        .list_expenses(alice.id, &ExpenseListFilter::default(), 1, 20)
        .await
        .unwrap();
    assert_eq!(all.total, 3);
    // Newest date first.
    assert_eq!(all.items[0].description, "Taxi");

    let by_category = engine
        .list_expenses(
            alice.id,
            &ExpenseListFilter {
                category_id: Some(food.id),
                ..Default::default()
            },
            1,
            20,
        )
        .await
        .unwrap();
    assert_eq!(by_category.total, 2);

    let by_range = engine
        .list_expenses(
            alice.id,
            &ExpenseListFilter {
                date_from: Some(day("2026-02-11")),
                date_to: Some(day("2026-02-12")),
                ..Default::default()
            },
            1,
            20,
        )
        .await
        .unwrap();
    assert_eq!(by_range.total, 2);

    let by_search = engine
        .list_expenses(
            alice.id,
            &ExpenseListFilter {
                search: Some("down".to_string()),
                ..Default::default()
            },
            1,
            20,
        )
        .await
        .unwrap();
    assert_eq!(by_search.total, 1);
    assert_eq!(by_search.items[0].description, "Dinner downtown");

    let second_page = engine
        .list_expenses(alice.id, &ExpenseListFilter::default(), 2, 2)
        .await
        .unwrap();
    assert_eq!(second_page.total, 3);
    assert_eq!(second_page.items.len(), 1);
}

#[tokio::test]
async fn expenses_are_owner_scoped() {
    let engine = engine_with_db().await;
    let alice = engine
        .create_user("alice@example.com", "Alice", "password")
        .await
        .unwrap();
    let bob = engine
        .create_user("bob@example.com", "Bob", "password")
        .await
        .unwrap();

    let expense = engine
        .create_expense(
            ExpenseCreateCmd::new(
                alice.id,
                "Dinner",
                100_00,
                day("2026-02-11"),
                SplitStrategy::Amount,
            )
            .line(SplitLine::user(alice.id).amount(MoneyCents::new(100_00))),
        )
        .await
        .unwrap();

    let err = engine.expense(bob.id, expense.id).await.unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
    assert_eq!(
        engine
            .list_expenses(bob.id, &ExpenseListFilter::default(), 1, 20)
            .await
            .unwrap()
            .total,
        0
    );
}

#[tokio::test]
async fn delete_expense_removes_shares() {
    let engine = engine_with_db().await;
    let alice = engine
        .create_user("alice@example.com", "Alice", "password")
        .await
        .unwrap();

    let expense = engine
        .create_expense(
            ExpenseCreateCmd::new(
                alice.id,
                "Dinner",
                100_00,
                day("2026-02-11"),
                SplitStrategy::Amount,
            )
            .line(SplitLine::user(alice.id).amount(MoneyCents::new(100_00))),
        )
        .await
        .unwrap();

    engine.delete_expense(alice.id, expense.id).await.unwrap();
    let err = engine.expense(alice.id, expense.id).await.unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}
