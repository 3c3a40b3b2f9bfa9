//! Main entry point for the keylock command line.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use keylock_common::error::SUCCESS;
use keylock_core::{LockError, LockToken};
use keylock_server::model::config::{Cli, Command, Configuration};
use keylock_server::service::ExampleService;
use keylock_server::startup;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let configuration = Configuration::new(&cli).context("failed to load configuration")?;

    let logging_config = configuration.logging_config();
    let _logging_guard =
        startup::init_logging(&logging_config).map_err(|e| anyhow::anyhow!("{}", e))?;

    keylock_core::metrics::init_metrics();

    let manager = Arc::new(
        startup::build_lock_manager(&configuration)
            .await
            .context("failed to start lock manager")?,
    );

    match cli.command {
        Command::Demo { callers, work_ms } => {
            let service =
                ExampleService::new(manager.clone()).with_work(Duration::from_millis(work_ms));

            let mut handles = Vec::with_capacity(callers);
            for caller in 0..callers {
                let service = service.clone();
                handles.push(tokio::spawn(async move {
                    (caller, service.test_lock().await)
                }));
            }

            for handle in handles {
                let (caller, result) = handle.await?;
                match result {
                    Ok(body) => {
                        info!(caller, code = SUCCESS.code, result = %body, "Caller finished")
                    }
                    Err(e) if e.is_contention() => warn!(
                        caller,
                        code = e.error_code().code,
                        error = %e,
                        "Caller rejected by lock"
                    ),
                    Err(e) => return Err(e.into()),
                }
            }

            println!("{}", serde_json::to_string_pretty(&manager.stats())?);
        }
        Command::Acquire { name, expire } => {
            let expire = expire.unwrap_or_else(|| configuration.default_expire());
            match manager.acquire(&name, expire).await {
                Ok(token) => println!("{}", token),
                Err(LockError::Contention { lock_key }) => {
                    anyhow::bail!("lock [{}] is held by another owner", lock_key)
                }
                Err(e) => return Err(e.into()),
            }
        }
        Command::Release { name, token } => {
            let token = LockToken::from_value(token);
            if manager.release(&name, &token).await? {
                println!("released");
            } else {
                println!("not owner, nothing released");
            }
        }
        Command::Status { name } => match manager.holder(&name).await? {
            Some(holder) => {
                let ttl = manager.remaining_ttl(&name).await?;
                println!(
                    "{} held by {} (expires in {}ms)",
                    manager.lock_key(&name),
                    holder,
                    ttl.map(|d| d.as_millis()).unwrap_or_default()
                );
            }
            None => println!("{} is free", manager.lock_key(&name)),
        },
    }

    Ok(())
}
