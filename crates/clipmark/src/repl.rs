//! Interactive session against a loaded tab.
//!
//! Each line is either a JSON page message (as the popup would send it) or
//! one of the commands below.

use crate::page::{frame_at, select_text};
use clipmark_common::protocol::PageMessage;
use clipmark_core::frame_selector;
use clipmark_engine::TabHandle;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

const BANNER: &[&str] = &[
    "Page loaded. Send page messages as JSON, e.g. {\"type\":\"highlight_selector\",\"selector\":\"h1\"}",
    "Commands: frames | find <frame> <text> | save <frame> | exit",
];

pub async fn run_repl(handle: &TabHandle) -> anyhow::Result<()> {
    for line in BANNER {
        println!("{}", line);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = std::io::stdout();
    loop {
        print!("> ");
        stdout.flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "exit" | "quit") {
            break;
        }
        match execute_line(handle, line).await {
            Ok(output) => {
                for out in output {
                    println!("{}", out);
                }
            }
            Err(e) => println!("Error: {}", e),
        }
    }
    Ok(())
}

async fn execute_line(handle: &TabHandle, line: &str) -> anyhow::Result<Vec<String>> {
    if line.starts_with('{') {
        let message: PageMessage = serde_json::from_str(line)?;
        let answers = handle.request(message).await?;
        return Ok(answers.into_iter().map(|a| a.text).collect());
    }

    let mut parts = line.splitn(3, ' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("frames"), None, None) => Ok(handle
            .with(|tab| {
                tab.page()
                    .frame_ids()
                    .enumerate()
                    .map(|(i, frame)| {
                        let selector = frame_selector(tab.page(), frame);
                        format!(
                            "#{} {} {}",
                            i,
                            tab.page().url(frame),
                            selector.as_deref().unwrap_or("(top)")
                        )
                    })
                    .collect::<Vec<String>>()
            })
            .await?),
        (Some("find"), Some(index), Some(needle)) => {
            let index: usize = index.parse()?;
            let needle = needle.to_string();
            handle
                .with(move |tab| {
                    let frame = frame_at(tab, index)?;
                    select_text(tab, frame, &needle)
                })
                .await??;
            Ok(vec!["Selected".to_string()])
        }
        (Some("save"), Some(index), None) => {
            let index: usize = index.parse()?;
            let frame = handle.with(move |tab| frame_at(tab, index)).await??;
            let responses = handle.capture(frame, 0).await?;
            Ok(responses
                .into_iter()
                .map(|r| serde_json::to_string(&r))
                .collect::<Result<_, _>>()?)
        }
        _ => anyhow::bail!("Unknown command: {}", line),
    }
}
