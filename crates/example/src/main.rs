//! Quillsign command-line demo.
//!
//! Every call goes through the instrumented client, so each operation is
//! logged by the audit hooks before and after it runs.
//!
//! # Usage
//!
//! ```bash
//! quillsign-demo account
//! quillsign-demo request <signature_request_id>
//! quillsign-demo requests [page]
//! quillsign-demo templates [page]
//! quillsign-demo download <signature_request_id> <output.pdf>
//! ```
//!
//! Configuration is read from the environment (or a `.env` file); see
//! [`ClientConfig::from_env`].

use example::{TracingConfig, register_audit_hooks};
use quillsign_client::{
    ClientConfig, ClientError, FileFormat, PageQuery, SignClient, SignatureApi,
    SignatureApiOperations,
};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    TracingConfig::from_env().init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        eprintln!("Usage: quillsign-demo <account|request|requests|templates|download> [args]");
        std::process::exit(1);
    };

    let client = match ClientConfig::from_env()
        .map_err(ClientError::from)
        .and_then(SignatureApi::connect)
    {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = register_audit_hooks(&client) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    if let Err(e) = run(&client, command, &args[1..]).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(client: &SignClient, command: &str, args: &[String]) -> Result<(), ClientError> {
    match (command, args) {
        ("account", []) => {
            let account = client.get_account().await?;
            println!("{} <{}>", account.account_id, account.email_address);
        }
        ("request", [id]) => {
            let request = client.get_signature_request(id).await?;
            println!(
                "{} complete={}",
                request.signature_request_id, request.is_complete
            );
            for signature in &request.signatures {
                println!(
                    "  {} {}",
                    signature.signer_email_address, signature.status_code
                );
            }
        }
        ("requests", rest) => {
            let page = client.list_signature_requests(&page_query(rest)?).await?;
            for request in &page.items {
                println!(
                    "{} {}",
                    request.signature_request_id,
                    request.title.as_deref().unwrap_or("(untitled)")
                );
            }
            println!("page {}/{}", page.list_info.page, page.list_info.num_pages);
        }
        ("templates", rest) => {
            let page = client.list_templates(&page_query(rest)?).await?;
            for template in &page.items {
                println!(
                    "{} {}",
                    template.template_id,
                    template.title.as_deref().unwrap_or("(untitled)")
                );
            }
        }
        ("download", [id, output]) => {
            let bytes = client.download_files(id, FileFormat::Pdf).await?;
            std::fs::write(output, &bytes).map_err(|err| {
                ClientError::InvalidRequest(format!("cannot write {output}: {err}"))
            })?;
            println!("wrote {} bytes to {output}", bytes.len());
        }
        (other, _) => {
            return Err(ClientError::InvalidRequest(format!(
                "unknown command or arguments: '{other}'"
            )));
        }
    }
    Ok(())
}

fn page_query(args: &[String]) -> Result<PageQuery, ClientError> {
    match args {
        [] => Ok(PageQuery::new()),
        [page] => page
            .parse()
            .map(|page| PageQuery::new().with_page(page))
            .map_err(|_| ClientError::InvalidRequest(format!("invalid page: '{page}'"))),
        _ => Err(ClientError::InvalidRequest("too many arguments".into())),
    }
}
