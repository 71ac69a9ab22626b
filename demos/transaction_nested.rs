//! Editing a nested JSON document inside a scoped transaction.
use serde_json::json;
use txmap::{Error, from_json, to_json, transaction::transact};

fn main() -> Result<(), Error> {
    let mut doc = from_json(json!({
        "user": {
            "name": "Alice",
            "settings": { "theme": "dark", "beta": false }
        },
        "visits": 3
    }))?;

    // A scope that succeeds is committed
    transact(&mut doc, |tx| {
        tx.set("visits", 4);
        let mut user = tx
            .get(&"user".to_string())?
            .into_map()
            .ok_or(Error::PreconditionViolation { found: "scalar" })?;
        let mut settings = user
            .get(&"settings".to_string())?
            .into_map()
            .ok_or(Error::PreconditionViolation { found: "scalar" })?;
        settings.set("theme", "light");
        settings.delete(&"beta".to_string())?;
        Ok::<_, Error>(())
    })?;
    println!("After commit: {}", to_json(doc.clone()));

    // A scope that fails is rolled back, and its error is handed back unchanged
    let failed = transact(&mut doc, |tx| {
        tx.set("visits", 0);
        tx.delete(&"nonexistent".to_string())?;
        Ok::<_, Error>(())
    });
    println!("Rolled back: {}", failed.unwrap_err());
    println!("After rollback: {}", to_json(doc));

    Ok(())
}
