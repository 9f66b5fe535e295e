use crossterm::style::{Color, Stylize};
use rand::seq::IndexedRandom;

const COLORS: [Color; 6] = [Color::Red, Color::Green, Color::Blue, Color::Yellow, Color::Magenta, Color::Cyan];

const ART: &str = r"
  ___ ____ ____        _   _ _   _ _   _ _____ _____ ____
 |_ _/ ___|  _ \      | | | | | | | \ | |_   _| ____|  _ \
  | | |   | |_) |_____| |_| | | | |  \| | | | |  _| | |_) |
  | | |___|  __/______|  _  | |_| | |\  | | | | |___|  _ <
 |___\____|_|         |_| |_|\___/|_| \_| |_| |_____|_| \_\
";

/// Print the start-up banner in randomly picked colours.
pub fn print() {
    let mut rng = rand::rng();
    let art = *COLORS.choose(&mut rng).unwrap_or(&Color::Cyan);
    let text = *COLORS.choose(&mut rng).unwrap_or(&Color::White);

    println!("{}", ART.with(art));
    println!(
        "  {}\n",
        format!("ICP reverse lookup on Hunter  v{}  (for authorized research only)", env!("CARGO_PKG_VERSION")).with(text)
    );
}
