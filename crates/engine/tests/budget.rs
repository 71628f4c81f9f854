use std::sync::Arc;

use engine::{
    EngineError, ExpenseMirror, ItemPatch, ListKind, MemoryMirror, MoneyCents, NewItem, NewList,
    Quantity, ToggleOutcome,
};

mod common;
use common::{RecordingObserver, add_item, current, engine_with, engine_with_db, grocery};

#[tokio::test]
async fn rice_toggle_round_trip_restores_budget() {
    let (engine, _db) = engine_with_db().await;
    let list_id = grocery(&engine, "Weekly", Some(100_00)).await;
    let rice = add_item(&engine, &list_id, "Rice", 8_50, 2_000).await;

    let outcome = engine.toggle(&rice).await.unwrap();
    assert_eq!(
        outcome,
        ToggleOutcome::Toggled {
            purchased: true,
            budget: Some(MoneyCents::new(83_00)),
            mirror_synced: true,
        }
    );
    assert_eq!(current(&engine, &list_id).await, 83_00);
    assert!(engine.item(&rice).await.unwrap().purchased);

    let summary = engine.expense_summary(&list_id).await.unwrap();
    assert_eq!(summary.spent, MoneyCents::new(17_00));
    assert_eq!(summary.remaining, Some(MoneyCents::new(83_00)));
    assert_eq!(summary.original, Some(MoneyCents::new(100_00)));

    let outcome = engine.toggle(&rice).await.unwrap();
    assert_eq!(
        outcome,
        ToggleOutcome::Toggled {
            purchased: false,
            budget: Some(MoneyCents::new(100_00)),
            mirror_synced: true,
        }
    );
    assert_eq!(current(&engine, &list_id).await, 100_00);
    let summary = engine.expense_summary(&list_id).await.unwrap();
    assert_eq!(summary.spent, MoneyCents::ZERO);
}

#[tokio::test]
async fn unpriced_item_toggle_requires_price_and_changes_nothing() {
    let observer = Arc::new(RecordingObserver::default());
    let (engine, _db) = engine_with(Arc::new(MemoryMirror::new()), observer.clone()).await;
    let list_id = grocery(&engine, "Weekly", Some(100_00)).await;
    let beans = add_item(&engine, &list_id, "Beans", 0, 1_000).await;

    let outcome = engine.toggle(&beans).await.unwrap();
    assert_eq!(
        outcome,
        ToggleOutcome::PriceRequired {
            item_id: beans.clone()
        }
    );
    assert!(!engine.item(&beans).await.unwrap().purchased);
    assert_eq!(current(&engine, &list_id).await, 100_00);
    assert_eq!(observer.events(), vec![format!("price_required:{beans}")]);

    // once priced, the same toggle goes through
    let item = engine.set_price(&beans, MoneyCents::new(3_99)).await.unwrap();
    assert_eq!(item.price, MoneyCents::new(3_99));
    assert!(!item.purchased);
    assert_eq!(current(&engine, &list_id).await, 100_00);

    engine.toggle(&beans).await.unwrap();
    assert_eq!(current(&engine, &list_id).await, 96_01);
}

#[tokio::test]
async fn invariant_holds_after_a_sequence_of_toggles() {
    let (engine, _db) = engine_with_db().await;
    let list_id = grocery(&engine, "Monthly", Some(250_00)).await;
    let rice = add_item(&engine, &list_id, "Rice", 8_50, 2_000).await;
    let cheese = add_item(&engine, &list_id, "Cheese", 3_99, 1_500).await;
    let milk = add_item(&engine, &list_id, "Milk", 4_25, 6_000).await;
    let salt = add_item(&engine, &list_id, "Salt", 0, 1_000).await;

    for id in [&rice, &cheese, &milk, &salt, &cheese, &rice, &cheese, &milk, &rice] {
        engine.toggle(id).await.unwrap();
    }

    let budget = engine.budget(&list_id).await.unwrap().unwrap();
    let spent: MoneyCents = engine
        .items(&list_id)
        .await
        .unwrap()
        .iter()
        .filter(|i| i.purchased && i.price.is_positive())
        .map(|i| i.total().unwrap())
        .sum();
    // rice and cheese are purchased: 17.00 + 5.99 (3.99 × 1.5 = 5.985)
    assert_eq!(spent, MoneyCents::new(22_99));
    assert_eq!(budget.current + spent, budget.original);
    assert_eq!(engine.expense_summary(&list_id).await.unwrap().spent, spent);
    engine.check_consistency(&list_id).await.unwrap();
}

#[tokio::test]
async fn overspending_drives_the_budget_negative() {
    let (engine, _db) = engine_with_db().await;
    let list_id = grocery(&engine, "Tight", Some(10_00)).await;
    let rice = add_item(&engine, &list_id, "Rice", 8_50, 2_000).await;

    engine.toggle(&rice).await.unwrap();
    assert_eq!(current(&engine, &list_id).await, -7_00);
}

#[tokio::test]
async fn list_without_budget_still_tracks_expense() {
    let (engine, _db) = engine_with_db().await;
    let list_id = grocery(&engine, "Open", None).await;
    let rice = add_item(&engine, &list_id, "Rice", 8_50, 2_000).await;

    let outcome = engine.toggle(&rice).await.unwrap();
    assert_eq!(
        outcome,
        ToggleOutcome::Toggled {
            purchased: true,
            budget: None,
            mirror_synced: true,
        }
    );
    assert_eq!(engine.budget(&list_id).await.unwrap(), None);
    let summary = engine.expense_summary(&list_id).await.unwrap();
    assert_eq!(summary.spent, MoneyCents::new(17_00));
    assert_eq!(summary.remaining, None);
}

#[tokio::test]
async fn repricing_a_purchased_item_moves_the_difference() {
    let (engine, _db) = engine_with_db().await;
    let list_id = grocery(&engine, "Weekly", Some(100_00)).await;
    let rice = add_item(&engine, &list_id, "Rice", 8_50, 2_000).await;
    engine.toggle(&rice).await.unwrap();

    engine.set_price(&rice, MoneyCents::new(9_00)).await.unwrap();
    assert_eq!(current(&engine, &list_id).await, 82_00);
    assert_eq!(
        engine.expense_summary(&list_id).await.unwrap().spent,
        MoneyCents::new(18_00)
    );

    let item = engine
        .update_item(
            &rice,
            ItemPatch {
                quantity: Some(Quantity::units(3)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(item.quantity, Quantity::units(3));
    assert_eq!(current(&engine, &list_id).await, 73_00);
    engine.check_consistency(&list_id).await.unwrap();

    engine.toggle(&rice).await.unwrap();
    assert_eq!(current(&engine, &list_id).await, 100_00);
}

#[tokio::test]
async fn repricing_an_unpurchased_item_leaves_budget_alone() {
    let (engine, _db) = engine_with_db().await;
    let list_id = grocery(&engine, "Weekly", Some(100_00)).await;
    let rice = add_item(&engine, &list_id, "Rice", 8_50, 2_000).await;

    engine.set_price(&rice, MoneyCents::new(12_00)).await.unwrap();
    assert_eq!(current(&engine, &list_id).await, 100_00);
    assert_eq!(
        engine.expense_summary(&list_id).await.unwrap().spent,
        MoneyCents::ZERO
    );
}

#[tokio::test]
async fn update_item_patches_text_fields() {
    let (engine, _db) = engine_with_db().await;
    let list_id = grocery(&engine, "Weekly", None).await;
    let item = engine
        .new_item(
            &list_id,
            NewItem {
                name: "Rice".to_string(),
                category: Some("Grains".to_string()),
                observation: Some("brown".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(item.quantity, Quantity::ONE);
    assert_eq!(item.price, MoneyCents::ZERO);

    let item = engine
        .update_item(
            &item.id,
            ItemPatch {
                name: Some("  Basmati rice ".to_string()),
                observation: engine::FieldPatch::Clear,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(item.name, "Basmati rice");
    assert_eq!(item.category.as_deref(), Some("Grains"));
    assert_eq!(item.observation, None);
    assert_eq!(engine.item(&item.id).await.unwrap(), item);
}

#[tokio::test]
async fn invalid_prices_and_quantities_are_rejected() {
    let (engine, _db) = engine_with_db().await;
    let list_id = grocery(&engine, "Weekly", Some(100_00)).await;
    let rice = add_item(&engine, &list_id, "Rice", 8_50, 2_000).await;

    assert!(
        engine
            .set_price(&rice, MoneyCents::ZERO)
            .await
            .unwrap_err()
            .is_validation()
    );
    assert!(
        engine
            .new_item(
                &list_id,
                NewItem {
                    name: "Air".to_string(),
                    quantity: Quantity::from_milli(0),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err()
            .is_validation()
    );
    assert!(
        engine
            .new_item(
                &list_id,
                NewItem {
                    name: "  ".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err()
            .is_validation()
    );

    // a purchased item cannot lose its price
    engine.toggle(&rice).await.unwrap();
    let err = engine
        .update_item(
            &rice,
            ItemPatch {
                price: Some(MoneyCents::ZERO),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(engine.item(&rice).await.unwrap().price, MoneyCents::new(8_50));
    assert_eq!(current(&engine, &list_id).await, 83_00);
}

#[tokio::test]
async fn deleting_a_purchased_item_gives_its_expense_back() {
    let (engine, _db) = engine_with_db().await;
    let list_id = grocery(&engine, "Weekly", Some(100_00)).await;
    let rice = add_item(&engine, &list_id, "Rice", 8_50, 2_000).await;
    let milk = add_item(&engine, &list_id, "Milk", 4_25, 1_000).await;
    engine.toggle(&rice).await.unwrap();
    engine.toggle(&milk).await.unwrap();
    assert_eq!(current(&engine, &list_id).await, 78_75);

    engine.delete_item(&rice).await.unwrap();
    assert_eq!(current(&engine, &list_id).await, 95_75);
    assert_eq!(
        engine.expense_summary(&list_id).await.unwrap().spent,
        MoneyCents::new(4_25)
    );
    assert!(engine.item(&rice).await.unwrap_err().is_not_found());
    engine.check_consistency(&list_id).await.unwrap();
}

#[tokio::test]
async fn unknown_ids_are_not_found() {
    let (engine, _db) = engine_with_db().await;

    assert!(engine.toggle("missing").await.unwrap_err().is_not_found());
    assert!(
        engine
            .set_price("missing", MoneyCents::new(1_00))
            .await
            .unwrap_err()
            .is_not_found()
    );
    assert!(engine.delete_item("missing").await.unwrap_err().is_not_found());
    assert!(
        engine
            .new_item(
                "missing",
                NewItem {
                    name: "Rice".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err()
            .is_not_found()
    );
}

#[tokio::test]
async fn order_lists_cannot_have_a_budget() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .new_list(NewList {
            name: "Supplier".to_string(),
            kind: ListKind::Order,
            ref_month: None,
            budget: Some(MoneyCents::new(10_00)),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
    assert!(engine.lists().await.unwrap().is_empty());
}

#[tokio::test]
async fn renaming_a_purchased_item_renames_its_mirror_entry() {
    let mirror = Arc::new(MemoryMirror::new());
    let (engine, _db) = engine_with(mirror.clone(), Arc::new(RecordingObserver::default())).await;
    let list_id = grocery(&engine, "Weekly", Some(100_00)).await;
    let rice = add_item(&engine, &list_id, "Rice", 8_50, 2_000).await;
    engine.toggle(&rice).await.unwrap();

    engine
        .update_item(
            &rice,
            ItemPatch {
                name: Some("Brown rice".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let entries = mirror.entries_for(&list_id).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].item_name, "Brown rice");
    assert_eq!(entries[0].expense, MoneyCents::new(17_00));
    assert_eq!(current(&engine, &list_id).await, 83_00);
}

#[tokio::test]
async fn purchased_item_cannot_be_edited_to_a_zero_expense() {
    let mirror = Arc::new(MemoryMirror::new());
    let (engine, _db) = engine_with(mirror.clone(), Arc::new(RecordingObserver::default())).await;
    let list_id = grocery(&engine, "Weekly", Some(100_00)).await;
    let salt = add_item(&engine, &list_id, "Salt", 1_00, 1_000).await;
    engine.toggle(&salt).await.unwrap();

    // 0.001 x 0.01 rounds to 0.00
    let err = engine
        .update_item(
            &salt,
            ItemPatch {
                quantity: Some(Quantity::from_milli(1)),
                price: Some(MoneyCents::new(1)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(err.is_validation());

    let item = engine.item(&salt).await.unwrap();
    assert_eq!(item.quantity, Quantity::ONE);
    assert_eq!(item.price, MoneyCents::new(1_00));
    assert_eq!(current(&engine, &list_id).await, 99_00);
    assert_eq!(mirror.sum_for(&list_id).await.unwrap(), MoneyCents::new(1_00));

    // the same edit is fine once the item is unmarked
    engine.toggle(&salt).await.unwrap();
    engine
        .update_item(
            &salt,
            ItemPatch {
                quantity: Some(Quantity::from_milli(1)),
                price: Some(MoneyCents::new(1)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(current(&engine, &list_id).await, 100_00);
}

#[tokio::test]
async fn negative_initial_budget_is_rejected() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .new_list(NewList {
            name: "Weekly".to_string(),
            kind: ListKind::Grocery,
            ref_month: None,
            budget: Some(MoneyCents::new(-5_00)),
        })
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert!(engine.lists().await.unwrap().is_empty());

    let list_id = grocery(&engine, "Weekly", Some(0)).await;
    assert_eq!(current(&engine, &list_id).await, 0);
}
