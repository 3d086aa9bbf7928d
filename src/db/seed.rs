//! Demo data for local development.
//!
//! Inserts three actors, four addresses (the third actor gets two), four
//! movies, six actor–movie links and an `admin` user.

use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

use crate::db::models::{NewActor, NewAddress, NewMovie, NewUser};
use crate::db::{Database, DatabaseError};
use crate::security::password::{hash_password, PasswordError};

const FIRST_NAMES: &[&str] = &["Ada", "Grace", "Alan", "Linus", "Margaret", "Dennis", "Barbara"];
const LAST_NAMES: &[&str] = &["Lovelace", "Hopper", "Turing", "Torvalds", "Hamilton", "Ritchie"];
const PLACES: &[(&str, &str, &str)] = &[
    ("Portugal", "Lisbon", "1100-048"),
    ("France", "Lyon", "69002"),
    ("Japan", "Osaka", "530-0001"),
    ("Canada", "Toronto", "M5V 2T6"),
    ("Brazil", "Recife", "50030-230"),
];
const STREETS: &[&str] = &["Main Street", "Harbour Road", "Station Lane", "Elm Avenue"];
const TITLE_WORDS: &[&str] = &[
    "Silent", "Midnight", "Iron", "Last", "Crimson", "Garden", "Signal", "Horizon", "River",
];

/// Actor index → movie index pairs linked by the seed.
const LINKS: &[(usize, usize)] = &[(0, 0), (1, 1), (2, 2), (2, 3), (1, 3), (0, 3)];

/// Username of the seeded administrator.
pub const ADMIN_USERNAME: &str = "admin";

#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

/// Row counts inserted by [`seed_data`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub actors: usize,
    pub addresses: usize,
    pub movies: usize,
    pub links: usize,
    pub users: usize,
}

struct SeedPlan {
    actors: Vec<NewActor>,
    /// Actor index and address without the actor id.
    addresses: Vec<(usize, NewAddress)>,
    movies: Vec<NewMovie>,
}

fn pick<'a, R: Rng>(rng: &mut R, items: &[&'a str]) -> &'a str {
    items.choose(rng).copied().unwrap_or_default()
}

fn plan<R: Rng>(rng: &mut R) -> SeedPlan {
    let actors = (0..3)
        .map(|_| NewActor {
            name: format!("{} {}", pick(rng, FIRST_NAMES), pick(rng, LAST_NAMES)),
            age: rng.gen_range(10..=90),
        })
        .collect();

    let addresses = [0usize, 1, 2, 2]
        .into_iter()
        .map(|actor| {
            let (country, city, postcode) = PLACES[rng.gen_range(0..PLACES.len())];
            let address = NewAddress {
                country: country.to_string(),
                city: city.to_string(),
                address_line_1: format!("{} {}", rng.gen_range(1..=250), pick(rng, STREETS)),
                address_line_2: None,
                postcode: postcode.to_string(),
                actor_id: 0,
            };
            (actor, address)
        })
        .collect();

    let movies = (0..4)
        .map(|_| NewMovie {
            title: format!("The {} {}", pick(rng, TITLE_WORDS), pick(rng, TITLE_WORDS)),
            year: rng.gen_range(1950..=2024),
            rating: rng.gen_range(1..=5),
        })
        .collect();

    SeedPlan {
        actors,
        addresses,
        movies,
    }
}

/// Insert the demo data set. The admin user is only created once.
pub async fn seed_data(db: &Database, admin_password: &str) -> Result<SeedSummary, SeedError> {
    let plan = plan(&mut rand::thread_rng());
    let mut summary = SeedSummary::default();

    let mut actor_ids = Vec::with_capacity(plan.actors.len());
    for actor in &plan.actors {
        actor_ids.push(db.actors().create(actor).await?.id);
        summary.actors += 1;
    }

    for (actor, mut address) in plan.addresses {
        address.actor_id = actor_ids[actor];
        db.addresses().create(&address).await?;
        summary.addresses += 1;
    }

    let mut movie_ids = Vec::with_capacity(plan.movies.len());
    for movie in &plan.movies {
        movie_ids.push(db.movies().create(movie).await?.id);
        summary.movies += 1;
    }

    for (actor, movie) in LINKS {
        db.movies()
            .link_actor(movie_ids[*movie], actor_ids[*actor])
            .await?;
        summary.links += 1;
    }

    if db.users().find_by_username(ADMIN_USERNAME).await?.is_none() {
        db.users()
            .create(&NewUser {
                name: "Administrator".to_string(),
                username: ADMIN_USERNAME.to_string(),
                email: "admin@example.com".to_string(),
                password_hash: hash_password(admin_password)?,
                disabled: false,
            })
            .await?;
        summary.users += 1;
    }

    tracing::info!(
        actors = summary.actors,
        addresses = summary.addresses,
        movies = summary.movies,
        links = summary.links,
        users = summary.users,
        "Data seeded"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::PageRequest;
    use crate::db::test_support::memory_db;

    #[tokio::test]
    async fn seeds_expected_shape() {
        let db = memory_db().await;
        let summary = seed_data(&db, "secret").await.unwrap();
        assert_eq!(
            summary,
            SeedSummary {
                actors: 3,
                addresses: 4,
                movies: 4,
                links: 6,
                users: 1,
            }
        );

        let third = db
            .actors()
            .list(PageRequest { page: 1, page_size: 10 })
            .await
            .unwrap()
            .items[2]
            .id;
        assert_eq!(db.actors().addresses_of(third).await.unwrap().len(), 2);

        let again = seed_data(&db, "secret").await.unwrap();
        assert_eq!(again.users, 0);
        assert_eq!(again.actors, 3);
    }
}
