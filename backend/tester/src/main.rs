//! Walks a live backend through create, list, update, get and delete of one entry.
use std::{env, error::Error};

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

type Outcome<T> = Result<T, Box<dyn Error>>;

#[tokio::main]
async fn main() -> Outcome<()> {
    let base = env::args()
        .nth(1)
        .unwrap_or_else(|| "http://localhost:8000".to_string());
    let client = Client::new();

    let created: Value = client
        .post(format!("{base}/entry/create"))
        .json(&json!({
            "dish": "Salad",
            "calories": 120,
            "fat": 2,
            "ingredients": ["lettuce", "tomato"],
        }))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    let id = created["id"].as_str().ok_or("create response has no id")?.to_string();
    println!("Created {id}");

    let entries: Vec<Value> = client.get(format!("{base}/entries")).send().await?.json().await?;
    check(entries.iter().any(|e| e["id"] == id.as_str()), "list contains entry")?;

    let updated: Value = client
        .put(format!("{base}/entry/update/{id}"))
        .json(&json!({ "fat": 3 }))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    check(updated["modifiedCount"] == 1, "update modified one entry")?;

    let fetched: Value = client
        .get(format!("{base}/entry/{id}"))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    check(fetched["fat"] == 3.0, "fat updated")?;
    check(fetched["dish"] == "Salad", "dish unchanged")?;

    let deleted: u64 = client
        .delete(format!("{base}/entry/delete/{id}"))
        .send()
        .await?
        .json()
        .await?;
    check(deleted == 1, "delete removed one entry")?;

    let gone = client.get(format!("{base}/entry/{id}")).send().await?;
    check(gone.status() == StatusCode::NOT_FOUND, "entry gone after delete")?;

    println!("All checks passed");

    Ok(())
}

fn check(passed: bool, label: &str) -> Outcome<()> {
    if !passed {
        return Err(format!("check failed: {label}").into());
    }

    println!("ok: {label}");
    Ok(())
}
