use crate::bot::ChatBot;
use crate::render::{ render_tips, render_transcript };

use log::{ info, warn };
use std::io::{ self, BufRead, Write };
use std::sync::mpsc;

enum Command<'a> {
    Submit(&'a str),
    Clear,
    Tips,
    Quit,
    Skip,
}

fn parse_command(line: &str) -> Command<'_> {
    match line.trim() {
        "" => Command::Skip,
        "/clear" => Command::Clear,
        "/tips" => Command::Tips,
        "/quit" | "/exit" => Command::Quit,
        _ => Command::Submit(line),
    }
}

/// Runs one interactive session over line-oriented input until EOF or `/quit`.
pub fn run_console<R: BufRead, W: Write>(bot: &ChatBot, mut input: R, mut output: W) -> io::Result<()> {
    let mut session = bot.new_session();
    info!("Console session {} started", session.id);

    let (render_tx, render_rx) = mpsc::channel::<String>();
    session.state.subscribe(
        Box::new(move |_, messages| {
            let _ = render_tx.send(render_transcript(messages));
        })
    );

    write!(output, "{}", render_transcript(session.state.messages()))?;
    writeln!(output, "Type a message, /tips for ideas, /clear to reset, /quit to leave.")?;
    output.flush()?;

    let mut buf = Vec::new();
    loop {
        buf.clear();
        if input.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let Ok(line) = std::str::from_utf8(&buf) else {
            warn!("Console session {}: skipping line that is not valid UTF-8", session.id);
            continue;
        };
        let line = line.trim_end_matches('\n').trim_end_matches('\r');
        match parse_command(line) {
            Command::Submit(text) => session.state.append_exchange(text),
            Command::Clear => session.state.clear(),
            Command::Tips => write!(output, "{}", render_tips())?,
            Command::Quit => break,
            Command::Skip => continue,
        }

        for frame in render_rx.try_iter() {
            write!(output, "{}", frame)?;
        }
        output.flush()?;
    }

    info!("Console session {} ended", session.id);
    Ok(())
}
