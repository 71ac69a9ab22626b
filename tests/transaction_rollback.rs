//! Tests for transaction rollback behavior.
//!
//! When a transaction is aborted, or dropped without calling commit(), all changes
//! should be rolled back, leaving the original map unchanged.

use txmap::{
    Error, Map, Scalar, Value, map,
    transaction::{Transaction, TxValue, transact},
};

fn key(k: &str) -> String {
    k.to_string()
}

#[test]
fn rollback_on_drop() {
    let mut base = map! { "name" => "Alice" };
    let original = base.clone();

    // Start transaction and make changes but DON'T commit
    {
        let mut tx = Transaction::new(&mut base);
        tx.set("name", "Bob");
        tx.set("age", 30u64);
        // Drop tx without calling commit() - should rollback
    }

    assert_eq!(base, original);

    // Verify original value still present and the new key was NOT added
    let mut tx = Transaction::new(&mut base);
    assert_eq!(
        tx.get(&key("name")).unwrap().as_scalar(),
        Some(&Scalar::from("Alice"))
    );
    assert!(matches!(tx.get(&key("age")), Err(Error::NotFound { .. })));
}

#[test]
fn rollback_nested_map() {
    let mut base = map! { "config" => { "version" => 1u64 } };
    let original = base.clone();

    {
        let mut tx = Transaction::new(&mut base);
        if let TxValue::Map(mut cfg) = tx.get(&key("config")).unwrap() {
            cfg.set("version", 2u64);
            cfg.set("debug", true);
        }
        // Drop without commit
    }

    assert_eq!(base, original);
}

#[test]
fn rollback_deletions() {
    let mut base = map! { "1" => 1, "2" => 2, "nested" => { "x" => "y" } };
    let original = base.clone();

    let mut tx = Transaction::new(&mut base);
    tx.delete(&key("1")).unwrap();
    tx.delete(&key("nested")).unwrap();
    assert!(!tx.contains_key(&key("1")));
    assert_eq!(tx.len(), 1);

    assert_eq!(tx.abort(), &original);
    assert!(tx.contains_key(&key("1")));
    assert_eq!(tx.len(), 3);
}

#[test]
fn abort_restores_mixed_changes() {
    let mut base = map! {
        "1" => 1,
        "2" => 2,
        "nested" => { "1" => 1 }
    };
    let original = base.clone();

    let mut tx = Transaction::new(&mut base);
    tx.set("1", "a");
    tx.set("3", 3);
    tx.delete(&key("2")).unwrap();
    tx.get(&key("nested"))
        .unwrap()
        .into_map()
        .unwrap()
        .set("1", 2);
    tx.abort();

    // aborted state is observable through the transaction too
    assert_eq!(tx.get(&key("1")).unwrap().as_scalar(), Some(&Scalar::I64(1)));
    assert_eq!(
        tx.get(&key("nested")).unwrap().to_value(),
        Value::Map(map! { "1" => 1 })
    );
    drop(tx);
    assert_eq!(base, original);
}

#[test]
fn deep_nesting_rolls_back_every_level() {
    let mut base = map! {
        "l1" => {
            "l2" => {
                "l3" => { "leaf" => 1 }
            }
        }
    };
    let original = base.clone();

    let mut tx = Transaction::new(&mut base);
    {
        let mut l1 = tx.get(&key("l1")).unwrap().into_map().unwrap();
        let mut l2 = l1.get(&key("l2")).unwrap().into_map().unwrap();
        let mut l3 = l2.get(&key("l3")).unwrap().into_map().unwrap();
        l3.set("leaf", 2);
        l3.set("new", 3);
    }
    assert!(!tx.diff().is_empty());
    assert_eq!(tx.abort(), &original);
    assert!(tx.diff().is_empty());
}

#[test]
fn scoped_rollback_on_error() {
    #[derive(Debug, PartialEq)]
    struct Rejected;

    let mut base = map! { "balance" => 100 };
    let result = transact(&mut base, |tx| {
        tx.set("balance", 50);
        tx.set("pending", true);
        Err::<(), _>(Rejected)
    });

    assert_eq!(result, Err(Rejected));
    assert_eq!(base, map! { "balance" => 100 });
}

#[test]
fn scoped_rollback_on_transaction_error() {
    let mut base = map! { "a" => 1 };
    let result: Result<(), Error> = transact(&mut base, |tx| {
        tx.set("b", 2);
        // not in the base nor in the transaction
        tx.delete(&key("c"))?;
        Ok(())
    });

    assert!(matches!(result, Err(Error::NotFound { .. })));
    assert_eq!(base, map! { "a" => 1 });
}

#[test]
fn rollback_of_empty_map_is_a_noop() {
    let mut base: Map = Map::default();
    let mut tx = Transaction::new(&mut base);
    assert!(tx.abort().is_empty());
    tx.set("k", Scalar::Null);
    assert!(tx.abort().is_empty());
}
