use std::io::{self, BufRead, Write};
use std::process;

use clap::Parser;

use task_assistant::cli::{Cli, Commands};
use task_assistant::{Assistant, ConversationTurn, Project};

fn main() {
    let cli = Cli::parse();

    let project = match Project::load(&cli.project) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to load project {}: {}", cli.project.display(), e);
            process::exit(1);
        }
    };

    let assistant = Assistant::new();

    match cli.command {
        Commands::Ask { utterance } => {
            let utterance = utterance.join(" ");
            println!("{}", assistant.answer_question(&project, &utterance, &[], None));
        }
        Commands::Plan { utterance } => {
            let utterance = utterance.join(" ");
            let plan = assistant.generate_command_plan(&project, &utterance, &[]);
            match serde_json::to_string_pretty(&plan) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("Failed to serialise plan: {}", e);
                    process::exit(1);
                }
            }
        }
        Commands::Chat => {
            if let Err(e) = chat(&assistant, &project) {
                eprintln!("Chat session failed: {}", e);
                process::exit(1);
            }
        }
    }
}

fn chat(assistant: &Assistant, project: &Project) -> io::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut history: Vec<ConversationTurn> = Vec::new();

    println!("Chatting about project '{}'. Type 'exit' to leave.", project.name);
    loop {
        print!("> ");
        stdout.flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let utterance = line.trim();
        if utterance.is_empty() {
            continue;
        }
        if utterance.eq_ignore_ascii_case("exit") || utterance.eq_ignore_ascii_case("quit") {
            break;
        }

        let reply = if assistant.classify(utterance, &history).is_command() {
            let plan = assistant.generate_command_plan(project, utterance, &history);
            serde_json::to_string_pretty(&plan).unwrap_or_else(|e| format!("plan error: {}", e))
        } else {
            assistant.answer_question(project, utterance, &history, None)
        };
        println!("{}", reply);

        history.push(ConversationTurn::user(utterance));
        history.push(ConversationTurn::assistant(reply));
    }
    Ok(())
}
