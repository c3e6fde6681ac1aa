use std::collections::BTreeMap;

use crate::{
    authentication::jwt::SessionData,
    constants::SHOPPING_LIST_HEADER,
    error::ServiceError,
    schema::{CartLine, ShoppingListEntry, Uuid},
    store::Store,
};

/// Merges lines with the same (name, unit) by summing their amounts.
///
/// Entries come out ordered by name, then unit, comparing bytes. The order
/// is independent of the order of `lines`.
pub fn aggregate_lines(lines: Vec<CartLine>) -> Vec<ShoppingListEntry> {
    let mut totals: BTreeMap<(String, String), i64> = BTreeMap::new();

    for line in lines {
        *totals
            .entry((line.name, line.measurement_unit))
            .or_default() += i64::from(line.amount);
    }

    totals
        .into_iter()
        .map(|((name, measurement_unit), total)| ShoppingListEntry {
            name,
            measurement_unit,
            total,
        })
        .collect()
}

/// Merged ingredient totals over every recipe in the user's cart.
/// An empty cart gives an empty report.
pub async fn build_report<S: Store>(
    store: &S,
    user_id: Uuid,
) -> Result<Vec<ShoppingListEntry>, ServiceError> {
    let lines = store.cart_lines(user_id).await?;
    Ok(aggregate_lines(lines))
}

pub fn render_text(report: &[ShoppingListEntry]) -> String {
    let mut lines = Vec::with_capacity(report.len() + 1);
    lines.push(String::from(SHOPPING_LIST_HEADER));
    lines.extend(
        report
            .iter()
            .map(|entry| format!("{} ({}) - {}", entry.name, entry.measurement_unit, entry.total)),
    );

    lines.join("\n")
}

pub async fn download_shopping_cart<S: Store>(
    store: &S,
    session: &SessionData,
) -> Result<String, ServiceError> {
    let report = build_report(store, session.user_id).await?;
    log::debug!(
        "Rendering shopping list of {} items for user {}",
        report.len(),
        session.user_id
    );

    Ok(render_text(&report))
}
