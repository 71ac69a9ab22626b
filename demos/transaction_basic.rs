use txmap::{Scalar, map, transaction::{Transaction, TxValue}};

fn main() {
    // Create a map to work on
    let mut profile = map! {
        "name" => "Alice",
        "age" => 30u64
    };

    // Stage some writes using the transaction API
    {
        let mut tx = Transaction::new(&mut profile);
        tx.set("active", true);
        tx.set("age", 31u64);

        println!("Staged changes: {:?}", tx.diff());
        println!("Base before commit: {:?}", tx.base());

        let committed = tx.commit();
        println!("Base after commit: {committed:?}");
    }

    // Changes that are aborted never reach the map
    {
        let mut tx = Transaction::new(&mut profile);
        tx.set("name", "Mallory");
        if let Err(err) = tx.delete(&"email".to_string()) {
            println!("Could not delete: {err}");
        }
        tx.abort();
    }

    // Read the data back
    let mut tx = Transaction::new(&mut profile);
    match tx.get(&"name".to_string()) {
        Ok(TxValue::Value(value)) => match value.as_scalar() {
            Some(Scalar::String(name)) => println!("Name: {name}"),
            _ => println!("Name has the wrong type"),
        },
        _ => println!("Name not found"),
    }

    match tx.get(&"age".to_string()).ok().and_then(|v| v.as_scalar().cloned()) {
        Some(Scalar::U64(age)) => println!("Age: {age}"),
        _ => println!("Age not found or wrong type"),
    }
}
