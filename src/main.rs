use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{ArgAction, Parser, ValueEnum};
use futures::StreamExt;
use kube_client::{
    config::{KubeConfigOptions, Kubeconfig},
    Api, Client,
};
use kube_core::DynamicObject;
use kube_diffwatch::{
    sink::{LogSink, WriterSink},
    subscriber::{self, GroupVersionResource},
    NormalizationPolicy, Sink,
};
use kube_runtime::watcher;
use tokio_util::sync::CancellationToken;

/// Watch a resource type and print what changes.
#[derive(Parser, Debug)]
#[command(name = "kube-diffwatch")]
struct Args {
    /// API group of the resource, empty for the core group
    #[arg(short, long, default_value = "")]
    group: String,
    /// API version of the resource
    #[arg(short = 'v', long)]
    version: String,
    /// Plural name of the resource, e.g. `deployments`
    #[arg(short, long)]
    resource: String,

    /// Path to a kubeconfig file; inferred from the environment if unset
    #[arg(long, env = "KUBECONFIG")]
    kubeconfig: Option<PathBuf>,

    /// Namespace to watch; all namespaces if unset or empty
    #[arg(short, long)]
    namespace: Option<String>,
    /// Label selector to filter resources
    #[arg(short, long)]
    label_selector: Option<String>,
    /// Field selector to filter resources
    #[arg(short, long)]
    field_selector: Option<String>,

    /// Include managed fields
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    include_managed_fields: bool,
    /// Include status
    #[arg(long, default_value_t = false, action = ArgAction::Set)]
    include_status: bool,

    /// Where to write the change feed
    #[arg(short, long, value_enum, default_value_t)]
    output: Output,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
enum Output {
    /// Plain text on standard output
    #[default]
    Stdout,
    /// One log record per change
    Log,
}

impl Args {
    fn policy(&self) -> NormalizationPolicy {
        NormalizationPolicy::default()
            .include_managed_fields(self.include_managed_fields)
            .include_status(self.include_status)
    }

    /// The namespace to scope the watch to. Empty means all namespaces.
    fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref().filter(|namespace| !namespace.is_empty())
    }

    fn watcher_config(&self) -> watcher::Config {
        let mut config = watcher::Config::default();
        if let Some(labels) = &self.label_selector {
            config = config.labels(labels);
        }
        if let Some(fields) = &self.field_selector {
            config = config.fields(fields);
        }
        config
    }
}

async fn client(kubeconfig: Option<&Path>) -> anyhow::Result<Client> {
    let config = match kubeconfig {
        Some(path) => {
            let kubeconfig = Kubeconfig::read_from(path)
                .with_context(|| format!("failed to read kubeconfig {}", path.display()))?;
            kube_client::Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default()).await?
        }
        None => kube_client::Config::infer().await?,
    };
    Client::try_from(config).context("failed to build client")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let gvr = GroupVersionResource::gvr(&args.group, &args.version, &args.resource);
    let resource = gvr.to_api_resource();
    let client = client(args.kubeconfig.as_deref()).await?;
    let api = match args.namespace() {
        Some(namespace) => Api::<DynamicObject>::namespaced_with(client, namespace, &resource),
        None => Api::<DynamicObject>::all_with(client, &resource),
    };
    let watcher_config = args.watcher_config();

    let config = kube_diffwatch::on(move || {
        subscriber::changes(api.clone(), watcher_config.clone(), resource.clone()).boxed()
    })
    .policy(args.policy());

    let sink: Box<dyn Sink> = match args.output {
        Output::Stdout => Box::new(WriterSink::stdout()),
        Output::Log => Box::new(LogSink::default()),
    };

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => cancel.cancel(),
                Err(err) => log::warn!("cannot listen for shutdown signal: {err}"),
            }
        }
    });

    log::info!("watching {gvr}");
    let stats = kube_diffwatch::run(config, sink.as_ref(), cancel)
        .await
        .with_context(|| format!("watching {gvr}"))?;
    log::info!("rendered {} changes, skipped {} errors", stats.events, stats.errors);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_the_flags() {
        let args = Args::try_parse_from(["kube-diffwatch", "-v", "v1", "-r", "pods"]).unwrap();
        assert_eq!(args.group, "");
        assert_eq!(args.output, Output::Stdout);
        assert_eq!(args.policy(), NormalizationPolicy::default());
    }

    #[test]
    fn policy_flags_take_values() {
        let args = Args::try_parse_from([
            "kube-diffwatch",
            "-g",
            "apps",
            "-v",
            "v1",
            "-r",
            "deployments",
            "--include-managed-fields=false",
            "--include-status",
            "true",
            "-l",
            "app=web",
            "-o",
            "log",
        ])
        .unwrap();
        assert_eq!(
            args.policy(),
            NormalizationPolicy {
                include_managed_fields: false,
                include_status: true,
            }
        );
        assert_eq!(args.label_selector.as_deref(), Some("app=web"));
        assert_eq!(args.output, Output::Log);
    }

    #[test]
    fn empty_namespace_means_all_namespaces() {
        let args = Args::try_parse_from(["kube-diffwatch", "-v", "v1", "-r", "pods", "-n", ""]).unwrap();
        assert_eq!(args.namespace(), None);

        let args = Args::try_parse_from(["kube-diffwatch", "-v", "v1", "-r", "pods"]).unwrap();
        assert_eq!(args.namespace(), None);

        let args = Args::try_parse_from(["kube-diffwatch", "-v", "v1", "-r", "pods", "-n", "kube-system"]).unwrap();
        assert_eq!(args.namespace(), Some("kube-system"));
    }

    #[test]
    fn version_and_resource_are_required() {
        assert!(Args::try_parse_from(["kube-diffwatch", "-r", "pods"]).is_err());
        assert!(Args::try_parse_from(["kube-diffwatch", "-v", "v1"]).is_err());
    }
}
