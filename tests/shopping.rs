mod common;

use std::sync::Arc;

use foodgram_sdk::{
    accounts::merge_cart,
    aggregation::aggregate,
    identity::{Actor, RequestIdentity, SessionKey},
    listing::shop_list,
    memory::MemoryStore,
    schema::UserRole,
    store::{Relation, RelationStore},
    toggle::{add, add_purchase, remove_purchase},
};

#[tokio::test]
async fn amounts_of_one_ingredient_are_summed() {
    let store = Arc::new(MemoryStore::new());
    let author = common::user(&store, "author", UserRole::User).await;
    common::ingredient(&store, "Мука", "г.").await;
    common::ingredient(&store, "Молоко", "мл.").await;
    let pancakes = common::recipe(
        &store,
        &author,
        "Блины",
        &["BREAKFAST"],
        &[("Мука", 100), ("Молоко", 250)],
    )
    .await;
    let fritters = common::recipe(&store, &author, "Оладьи", &["BREAKFAST"], &[("Мука", 50)]).await;

    let identity = common::identity(&author);
    for recipe in [&pancakes, &fritters] {
        assert!(add_purchase(&identity, recipe.id, &*store).await.unwrap().created);
    }

    let items = aggregate(Some(&Actor::User(author.id)), &*store).await.unwrap();
    let totals: Vec<(&str, i64, &str)> = items
        .iter()
        .map(|item| (item.title.as_str(), item.total, item.dimension.as_str()))
        .collect();
    assert_eq!(totals, vec![("Молоко", 250, "мл."), ("Мука", 150, "г.")]);
}

#[tokio::test]
async fn shared_lines_count_once_per_recipe() {
    let store = Arc::new(MemoryStore::new());
    let author = common::user(&store, "author", UserRole::User).await;
    common::ingredient(&store, "Мука", "г.").await;
    let first = common::recipe(&store, &author, "Хлеб", &["LUNCH"], &[("Мука", 100)]).await;
    let second = common::recipe(&store, &author, "Лепёшки", &["LUNCH"], &[("Мука", 100)]).await;

    let identity = common::identity(&author);
    add_purchase(&identity, first.id, &*store).await.unwrap();
    add_purchase(&identity, second.id, &*store).await.unwrap();

    let items = aggregate(Some(&Actor::User(author.id)), &*store).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].total, 200);
}

#[tokio::test]
async fn lists_without_an_owner_are_empty() {
    let store = MemoryStore::new();

    assert!(aggregate(None, &store).await.unwrap().is_empty());
    assert!(
        aggregate(Some(&Actor::Anonymous(SessionKey::generate())), &store)
            .await
            .unwrap()
            .is_empty()
    );
    assert_eq!(shop_list(&RequestIdentity::default(), &store).await.unwrap(), None);
}

#[tokio::test]
async fn anonymous_lists_survive_between_requests() {
    let store = Arc::new(MemoryStore::new());
    let author = common::user(&store, "author", UserRole::User).await;
    common::ingredient(&store, "Мука", "г.").await;
    let recipe = common::recipe(&store, &author, "Блины", &["BREAKFAST"], &[("Мука", 100)]).await;

    let outcome = add_purchase(&RequestIdentity::default(), recipe.id, &*store)
        .await
        .unwrap();
    let key = outcome.issued.unwrap();

    let returning = RequestIdentity::anonymous(Some(key.clone()));
    let listed = shop_list(&returning, &*store).await.unwrap().unwrap();
    assert_eq!(listed.iter().map(|r| r.id).collect::<Vec<_>>(), vec![recipe.id]);

    assert!(remove_purchase(&returning, recipe.id, &*store).await.unwrap());
    assert!(!remove_purchase(&returning, recipe.id, &*store).await.unwrap());
    assert!(shop_list(&returning, &*store).await.unwrap().unwrap().is_empty());
}

#[tokio::test]
async fn merging_moves_only_the_given_session() {
    let store = Arc::new(MemoryStore::new());
    let author = common::user(&store, "author", UserRole::User).await;
    let shopper = common::user(&store, "shopper", UserRole::User).await;
    common::ingredient(&store, "Мука", "г.").await;
    common::ingredient(&store, "Яйцо", "шт.").await;
    let pancakes = common::recipe(&store, &author, "Блины", &["BREAKFAST"], &[("Мука", 100)]).await;
    let omelette = common::recipe(&store, &author, "Омлет", &["BREAKFAST"], &[("Яйцо", 3)]).await;

    let (mine, theirs) = (SessionKey::generate(), SessionKey::generate());
    for recipe in [&pancakes, &omelette] {
        add_purchase(&RequestIdentity::anonymous(Some(mine.clone())), recipe.id, &*store)
            .await
            .unwrap();
    }
    add_purchase(&RequestIdentity::anonymous(Some(theirs.clone())), omelette.id, &*store)
        .await
        .unwrap();
    // Already on the user's list; must not end up twice.
    add_purchase(&common::identity(&shopper), pancakes.id, &*store)
        .await
        .unwrap();

    assert_eq!(merge_cart(&mine, shopper.id, &*store).await.unwrap(), 1);

    let owned: Vec<_> = store
        .list_purchases(&Actor::User(shopper.id))
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(owned, vec![omelette.id, pancakes.id]);
    assert!(store.list_purchases(&Actor::Anonymous(mine)).await.unwrap().is_empty());
    assert_eq!(
        store
            .list_purchases(&Actor::Anonymous(theirs))
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_adds_store_one_row() {
    let store = Arc::new(MemoryStore::new());
    let author = common::user(&store, "author", UserRole::User).await;
    let reader = common::user(&store, "reader", UserRole::User).await;
    common::ingredient(&store, "Мука", "г.").await;
    let recipe = common::recipe(&store, &author, "Блины", &["BREAKFAST"], &[("Мука", 100)]).await;
    let key = SessionKey::generate();

    let relations = [
        Relation::Purchase {
            actor: Actor::Anonymous(key.clone()),
            recipe_id: recipe.id,
        },
        Relation::Favorite {
            user_id: reader.id,
            recipe_id: recipe.id,
        },
    ];
    for relation in relations {
        let tasks: Vec<_> = (0..32)
            .map(|_| {
                let (store, relation) = (store.clone(), relation.clone());
                tokio::spawn(async move { add(&relation, &*store).await.unwrap() })
            })
            .collect();

        let mut created = 0;
        for task in tasks {
            if task.await.unwrap() {
                created += 1;
            }
        }
        assert_eq!(created, 1, "{relation:?}");
    }

    assert_eq!(store.list_purchases(&Actor::Anonymous(key)).await.unwrap().len(), 1);
    assert_eq!(store.favorite_ids(reader.id).await.unwrap(), vec![recipe.id]);
}
