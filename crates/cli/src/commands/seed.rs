use std::path::Path;

use catalog_db::{connect_with_settings, migrations, ProductFixtures, SeededProduct};

use crate::commands::{load_config, runtime, CommandResult};

pub fn run(config_path: Option<&Path>) -> CommandResult {
    let config = match load_config("seed", config_path) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match runtime("seed") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let seed_result = ProductFixtures::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;

        let verification = ProductFixtures::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

        let run_result = if verification.all_present {
            Ok(seed_result.products_seeded)
        } else {
            let failed = verification
                .checks
                .iter()
                .filter_map(|(id, passed)| (!passed).then_some(*id))
                .collect::<Vec<_>>();
            Err(("seed_verification", verification_failure_message(&failed), 6u8))
        };

        pool.close().await;
        run_result
    });

    match result {
        Ok(products) => CommandResult::success("seed", seed_summary(&products)),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

fn seed_summary(products: &[SeededProduct]) -> String {
    let lines: Vec<String> = products
        .iter()
        .map(|product| {
            let pricing = if product.discounted { "discounted" } else { "full price" };
            format!("  - {}: {} ({pricing})", product.id, product.title)
        })
        .collect();
    format!("demo catalog loaded with {} products:\n{}", products.len(), lines.join("\n"))
}

fn verification_failure_message(failed_ids: &[u64]) -> String {
    if failed_ids.is_empty() {
        return "some seed products failed to load".to_string();
    }
    let ids: Vec<String> = failed_ids.iter().map(u64::to_string).collect();
    format!("seed verification failed for product ids: {}", ids.join(", "))
}
