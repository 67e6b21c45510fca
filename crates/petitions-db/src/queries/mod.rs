mod categories;
mod petitions;
mod support_tiers;
mod supporters;
mod users;

use anyhow::Result;

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::Utc;

    use crate::Database;
    use crate::models::{NewPetition, NewSupportTier};

    pub fn user(db: &Database, email: &str) -> i64 {
        db.create_user(email, "Test", "User", "hash").unwrap()
    }

    pub fn petition(db: &Database, owner_id: i64, title: &str, costs: &[i64]) -> i64 {
        let titles: Vec<String> = (0..costs.len()).map(|i| format!("tier {i}")).collect();
        let tiers: Vec<NewSupportTier> = costs
            .iter()
            .zip(&titles)
            .map(|(cost, title)| NewSupportTier {
                title,
                description: "tier",
                cost: *cost,
            })
            .collect();
        db.create_petition(
            &NewPetition {
                title,
                description: "about",
                category_id: 1,
                owner_id,
                created_at: Utc::now(),
            },
            &tiers,
        )
        .unwrap()
    }
}
