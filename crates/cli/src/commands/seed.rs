use chrono::Local;
use q2d_db::seed_if_empty;

use crate::commands::{build_runtime, load_config, open_store, CommandResult};

pub fn run() -> CommandResult {
    let config = match load_config("seed") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match build_runtime("seed") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let mut store = open_store("seed", &config.storage).await?;
        let mut rng = rand::thread_rng();
        let added = seed_if_empty(&mut store, &mut rng, Local::now().date_naive()).await;
        Ok::<_, CommandResult>((added, store.state().items.len()))
    });

    match result {
        Ok((added, total)) => CommandResult::success("seed", seed_message(added, total)),
        Err(failure) => failure,
    }
}

fn seed_message(added: usize, total: usize) -> String {
    if added == 0 {
        format!("store already holds {total} items; no demo data added")
    } else {
        format!("added {added} demo items across all working stages")
    }
}
