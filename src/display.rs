use crate::conversation::{Message, MessageBody, Role};
use crate::utils::text::wrap_text;
use console::{Term, style};
use std::io;
use termimad::MadSkin;

const LABEL_WIDTH: usize = 10;
const MIN_WIDTH: usize = 40;

/// Where the conversation gets drawn.
pub trait Screen {
    fn clear(&mut self) -> io::Result<()>;
    fn print_line(&mut self, line: &str) -> io::Result<()>;

    /// Usable width in columns.
    fn width(&self) -> usize {
        80
    }
}

impl Screen for Term {
    fn clear(&mut self) -> io::Result<()> {
        self.clear_screen()
    }

    fn print_line(&mut self, line: &str) -> io::Result<()> {
        self.write_line(line)
    }

    fn width(&self) -> usize {
        self.size().1 as usize
    }
}

fn role_label(message: &Message) -> String {
    let label = match (message.role, &message.name) {
        (Role::Function, Some(name)) => format!("ƒ {}", name),
        (role, _) => role.to_string(),
    };
    let padded = format!("{:>width$}", label, width = LABEL_WIDTH);
    let styled = match message.role {
        Role::System => style(padded).dim(),
        Role::User => style(padded).bold().cyan(),
        Role::Assistant => style(padded).bold().magenta(),
        Role::Function => style(padded).bold().yellow(),
    };
    styled.to_string()
}

/// Same heuristic used to decide whether a reply is worth rendering as markdown.
fn looks_like_markdown(text: &str) -> bool {
    text.contains("```") || text.contains('*') || text.contains('`') || text.contains('#')
}

fn body_lines(message: &Message, width: usize) -> Vec<String> {
    let wrap = |text: &str| -> Vec<String> {
        text.lines()
            .flat_map(|line| wrap_text(line, width))
            .collect()
    };

    match &message.body {
        MessageBody::Text(text) if message.role == Role::Assistant && looks_like_markdown(text) => {
            let skin = MadSkin::default();
            skin.text(text, Some(width))
                .to_string()
                .lines()
                .map(str::to_string)
                .collect()
        }
        MessageBody::Text(text) => wrap(text),
        MessageBody::FunctionCall { call, text } => {
            let mut lines: Vec<String> = wrap(text)
                .into_iter()
                .map(|line| style(line).dim().to_string())
                .collect();
            let invocation = format!("→ {}({})", call.name, call.arguments);
            lines.extend(
                wrap_text(&invocation, width)
                    .into_iter()
                    .map(|line| style(line).yellow().to_string()),
            );
            lines
        }
    }
}

/// Lines for one message: a role label on the first, an indent on the rest.
pub fn format_message(message: &Message, width: usize) -> Vec<String> {
    let body_width = width.max(MIN_WIDTH) - LABEL_WIDTH - 3;
    let mut body = body_lines(message, body_width);
    if body.is_empty() {
        body.push(String::new());
    }

    let gutter = style("│").dim().to_string();
    let indent = " ".repeat(LABEL_WIDTH);
    body.into_iter()
        .enumerate()
        .map(|(i, line)| {
            if i == 0 {
                format!("{} {} {}", role_label(message), gutter, line)
            } else {
                format!("{} {} {}", indent, gutter, line)
            }
        })
        .collect()
}

pub fn display_banner(screen: &mut dyn Screen, provider: &str, model: &str) -> io::Result<()> {
    screen.print_line(&format!(
        "{} {}",
        style("chainchat").bold().magenta(),
        style(format!("({} · {})", provider, model)).dim()
    ))?;
    screen.print_line(
        &style("Type '/help' for commands. Press Ctrl+C or Ctrl+D to exit.")
            .dim()
            .to_string(),
    )
}
