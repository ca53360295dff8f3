use anyhow::Context;
use rand::{distributions::Alphanumeric, seq::SliceRandom, Rng};
use tracing::info;

use crate::users::{
    dto::{NewUser, Role},
    repo::UserRepository,
};

const FIRST_NAMES: &[&str] = &["Anna", "Boris", "Clara", "Dmitri", "Elena", "Felix", "Greta"];
const LAST_NAMES: &[&str] = &["Ivanova", "Novak", "Schmidt", "Petrov", "Larsen", "Moreau"];

/// Listed after seeding.
const PREVIEW_ROWS: i64 = 10;

fn fake_user<R: Rng>(rng: &mut R) -> NewUser {
    let first = FIRST_NAMES.choose(rng).copied().unwrap_or("Anna");
    let last = LAST_NAMES.choose(rng).copied().unwrap_or("Novak");
    let password: String = (0..12).map(|_| char::from(rng.sample(Alphanumeric))).collect();
    NewUser {
        name: format!("{first} {last}"),
        email: format!(
            "{}.{}{}@example.com",
            first.to_lowercase(),
            last.to_lowercase(),
            rng.gen_range(1..1000)
        ),
        password,
        role: if rng.gen_bool(0.2) { Role::Admin } else { Role::User },
    }
}

/// Inserts `count` random users, then prints the first rows of the table.
pub async fn run(users: &dyn UserRepository, count: usize) -> anyhow::Result<()> {
    for _ in 0..count {
        let user = fake_user(&mut rand::thread_rng());
        let id = users.create(&user).await.context("insert seed user")?;
        info!(user_id = id, name = %user.name, "seed user inserted");
    }

    let rows = users.list(PREVIEW_ROWS).await.context("list users")?;
    for u in rows {
        println!(
            "id: {}, name: {}, email: {}, role: {:?}, created_at: {}, updated_at: {:?}",
            u.id, u.name, u.email, u.role, u.created_at, u.updated_at
        );
    }
    Ok(())
}
