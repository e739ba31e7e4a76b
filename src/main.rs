use clap::Parser;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error};

use bosun::bootstrap::{BootstrapOrchestrator, Collaborators, SecretVerifier};
use bosun::cli::{Cli, Commands, RenderArgs, VerifySecretsArgs};
use bosun::config::BootstrapConfig;
use bosun::manifest;
use bosun::ops::{KclRenderer, KubectlCluster, Renderer};
use bosun::subprocess::SubprocessManager;
use bosun::validate::{built_in_checks, CheckContext, FailurePolicy, ParallelValidationRunner};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        2 => "trace",
        _ => "trace,hyper=debug,tower=debug",
    };

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(cli.verbose >= 2)
        .init();

    debug!("bosun started with verbosity level: {}", cli.verbose);

    let result = match cli.command {
        Commands::Bootstrap(args) => run_bootstrap(args).await,
        Commands::Render(args) => run_render(args).await,
        Commands::VerifySecrets(args) => run_verify_secrets(args).await,
        Commands::Validate(args) => run_validate(args).await,
    };

    if let Err(e) = result {
        error!("Fatal error: {}", e);
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

/// Watch channel flipped to true on Ctrl-C, so waits can unwind cleanly.
fn shutdown_signal() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = tx.send(true);
        }
    });
    rx
}

async fn run_bootstrap(args: bosun::cli::BootstrapArgs) -> anyhow::Result<()> {
    let config = args.into_config()?;
    let subprocess = SubprocessManager::production();
    let collaborators = Collaborators::production(&subprocess, config.kubeconfig.clone());

    let outcome = BootstrapOrchestrator::new(config, collaborators)
        .with_shutdown(shutdown_signal())
        .run()
        .await;

    println!("{}", outcome.report);
    match outcome.error {
        Some(err) => {
            eprintln!("❌ Bootstrap aborted");
            Err(err.into())
        }
        None => {
            println!("✅ Bootstrap completed");
            Ok(())
        }
    }
}

async fn run_render(args: RenderArgs) -> anyhow::Result<()> {
    let config = BootstrapConfig {
        template_ref: args
            .template_ref
            .unwrap_or_else(|| BootstrapConfig::default().template_ref),
        entrypoint: args.entrypoint,
        config_parameters: args.config_parameters,
        controller_version: args.controller_version,
        namespace: args.namespace,
        ..BootstrapConfig::default()
    };

    let subprocess = SubprocessManager::production();
    let renderer = KclRenderer::new(subprocess.runner());
    let params = bosun::bootstrap::renderer_params(&config);
    let rendered = renderer
        .render(&config.template_ref, &config.entrypoint, &params)
        .await?;

    if args.raw {
        println!("{rendered}");
        return Ok(());
    }

    let documents = manifest::classify(&rendered);
    println!(
        "Rendered {} config doc(s) and {} secret doc(s)",
        documents.config.len(),
        documents.secrets.len()
    );
    for name in manifest::extract_secret_names(&documents.secrets) {
        println!("  secret: {name}");
    }
    Ok(())
}

async fn run_verify_secrets(args: VerifySecretsArgs) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(&args.file)?;
    let documents = manifest::classify(&content);

    let subprocess = SubprocessManager::production();
    let cluster = Arc::new(KubectlCluster::new(subprocess.runner(), args.kubeconfig));
    let verifier = SecretVerifier::new(cluster);

    let (report, error) = verifier.verify(&documents.secrets, &args.namespace).await;
    println!("{report}");
    match error {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

async fn run_validate(args: bosun::cli::ValidateArgs) -> anyhow::Result<()> {
    let config = args.into_config()?;
    let policy = FailurePolicy::from_flag(&config.fail_on);

    let subprocess = SubprocessManager::production();
    let runner_handle = subprocess.runner();
    let checks = built_in_checks(&runner_handle, &config);
    let ctx = CheckContext {
        src: config.src.clone(),
    };

    let runner = ParallelValidationRunner::new(config.max_parallel);
    let outcome = runner.run(checks, ctx, &policy).await;

    println!("{}", outcome.report);
    if let Some(path) = &config.output {
        std::fs::write(path, &outcome.report)?;
        debug!("report written to {}", path.display());
    }

    match outcome.error {
        Some(err) => {
            eprintln!("❌ Validation failed");
            Err(err.into())
        }
        None => {
            println!("✅ Validation passed (policy: {policy})");
            Ok(())
        }
    }
}
