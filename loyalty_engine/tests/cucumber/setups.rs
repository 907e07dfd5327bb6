use cucumber::given;

use crate::cucumber::{LedgerSystem, LedgerWorld};

#[given("a fresh install")]
async fn fresh_database(world: &mut LedgerWorld) {
    let system = LedgerSystem::new().await;
    world.system = Some(system);
}

#[given(expr = "user '{word}' is registered")]
async fn register_user(world: &mut LedgerWorld, login: String) {
    let user = world.system().auth.register(&login, "correct horse").await.expect("Error registering user");
    world.users.insert(login, user.id);
}
