use std::path::Path;

use anyhow::{bail, Context};
use colored::Colorize;
use lfst_backend::{AnyBackend, BackendConfig};
use lfst_protocol::{keys, Args, BatchItem, ObjectReader, Session, TransferBackend, CAPABILITIES};
use lfst_types::{Oid, Operation, Pointer, RepoId};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    match cli.command {
        Command::Capabilities => cmd_capabilities(format),
        Command::Batch(args) => cmd_batch(args, format).await,
        Command::Download(args) => cmd_download(args).await,
        Command::Upload(args) => cmd_upload(args).await,
        Command::Verify(args) => cmd_verify(args, format).await,
    }
}

fn cmd_capabilities(format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(CAPABILITIES)?),
        OutputFormat::Text => {
            for capability in CAPABILITIES {
                println!("{capability}");
            }
        }
    }
    Ok(())
}

async fn cmd_batch(args: BatchArgs, format: OutputFormat) -> anyhow::Result<()> {
    let items = args
        .objects
        .iter()
        .map(|s| parse_pointer(s).map(BatchItem::new))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let mut extra = parse_args(&args.session.args)?;
    if let Some(reference) = args.reference {
        extra.insert(keys::REFNAME, reference);
    }
    if let Some(transfer) = args.transfer {
        extra.insert(keys::TRANSFER, transfer);
    }

    let backend = open_backend(&args.session, args.operation).await?;
    let items = backend.batch(args.operation, items, &extra).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&items)?),
        OutputFormat::Text => {
            for item in &items {
                let state = if item.present { "present".green() } else { "missing".yellow() };
                print!("{} {} {}", item.oid(), item.size(), state);
                for (key, value) in item.args.iter() {
                    print!(" {}={}", key.dimmed(), value);
                }
                println!();
            }
        }
    }
    Ok(())
}

async fn cmd_download(args: DownloadArgs) -> anyhow::Result<()> {
    let oid = parse_oid(&args.oid)?;
    let extra = with_id(parse_args(&args.session.args)?, args.id);
    let backend = open_backend(&args.session, Operation::Download).await?;

    let mut object = backend.download(&oid, &extra).await?;
    let copied = match &args.output {
        Some(path) => {
            let mut file = tokio::fs::File::create(path)
                .await
                .with_context(|| format!("create {}", path.display()))?;
            let copied = tokio::io::copy(&mut object.reader, &mut file).await?;
            file.flush().await?;
            copied
        }
        None => {
            let mut stdout = tokio::io::stdout();
            let copied = tokio::io::copy(&mut object.reader, &mut stdout).await?;
            stdout.flush().await?;
            copied
        }
    };
    if copied != object.size {
        bail!("short download: expected {} bytes, got {copied}", object.size);
    }
    debug!(oid = %oid.short_hex(), size = copied, "downloaded");
    Ok(())
}

async fn cmd_upload(args: UploadArgs) -> anyhow::Result<()> {
    let oid = parse_oid(&args.oid)?;
    let extra = with_id(parse_args(&args.session.args)?, args.id);
    let reader: ObjectReader = match &args.input {
        Some(path) => Box::new(open_input(path).await?),
        None => Box::new(tokio::io::stdin()),
    };

    let backend = open_backend(&args.session, Operation::Upload).await?;
    backend.upload(&oid, args.size, Some(reader), &extra).await?;
    eprintln!("{} uploaded {} ({} bytes)", "✓".green().bold(), oid.to_string().yellow(), args.size);
    Ok(())
}

async fn cmd_verify(args: VerifyArgs, format: OutputFormat) -> anyhow::Result<()> {
    let oid = parse_oid(&args.oid)?;
    let extra = with_id(parse_args(&args.session.args)?, args.id);
    let backend = open_backend(&args.session, Operation::Upload).await?;

    let status = backend.verify(&oid, args.size, &extra).await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(&status)?),
        OutputFormat::Text => println!("{} {}", "✓".green().bold(), status),
    }
    Ok(())
}

async fn open_backend(session: &SessionArgs, operation: Operation) -> anyhow::Result<AnyBackend> {
    let config = BackendConfig::load(&session.config)?;
    let repo = RepoId::new(session.repo.as_str())
        .with_context(|| format!("invalid repository {:?}", session.repo))?;
    let session = Session::new(repo, operation, session.token.as_str());

    let cancel = session.cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    Ok(AnyBackend::from_config(&config, &session).await?)
}

async fn open_input(path: &Path) -> anyhow::Result<tokio::fs::File> {
    tokio::fs::File::open(path)
        .await
        .with_context(|| format!("open {}", path.display()))
}

fn parse_oid(s: &str) -> anyhow::Result<Oid> {
    s.parse().with_context(|| format!("invalid oid {s:?}"))
}

fn parse_pointer(s: &str) -> anyhow::Result<Pointer> {
    let (oid, size) = s
        .split_once(':')
        .with_context(|| format!("expected oid:size, got {s:?}"))?;
    let size = size.parse().with_context(|| format!("invalid size in {s:?}"))?;
    Ok(Pointer::new(parse_oid(oid)?, size))
}

fn parse_args(raw: &[String]) -> anyhow::Result<Args> {
    raw.iter()
        .map(|kv| {
            kv.split_once('=')
                .with_context(|| format!("expected key=value, got {kv:?}"))
        })
        .collect()
}

fn with_id(mut args: Args, id: Option<String>) -> Args {
    if let Some(id) = id {
        args.insert(keys::ID, id);
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_from_cli() {
        let oid = Oid::from_bytes(b"hello");
        let pointer = parse_pointer(&format!("{oid}:5")).unwrap();
        assert_eq!(pointer, Pointer::new(oid, 5));

        assert!(parse_pointer("nocolon").is_err());
        assert!(parse_pointer(&format!("{oid}:big")).is_err());
        assert!(parse_pointer("zz:5").is_err());
    }

    #[test]
    fn args_from_cli() {
        let args = parse_args(&["id=http://x/y".into(), "token=a=b".into()]).unwrap();
        assert_eq!(args.get(keys::ID), Some("http://x/y"));
        assert_eq!(args.get(keys::TOKEN), Some("a=b"));
        assert!(parse_args(&["novalue".into()]).is_err());
    }

    #[test]
    fn explicit_id_overrides_arg() {
        let args = with_id(Args::new().with(keys::ID, "old"), Some("new".into()));
        assert_eq!(args.get(keys::ID), Some("new"));
    }
}
