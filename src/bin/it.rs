//! Interactive console for poking at a [`BPlusTreeMap`].
//!
//! Reads one command per line from stdin and prints the tree level by
//! level after each mutation:
//!
//! ```text
//! -> i <key> <value>    insert a pair
//! -> d <key>            remove a key
//! ```

use std::error::Error;
use std::io::{self, BufRead, Write};

use bptree::BPlusTreeMap;

fn main() -> Result<(), Box<dyn Error>> {
    let mut tree: BPlusTreeMap<i64, i64> = BPlusTreeMap::new(4)?;

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut line = String::new();
    loop {
        stdout.write_all(b"-> ")?;
        stdout.flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Ok(());
        }
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            continue;
        };

        match (command, words.next(), words.next()) {
            ("i", Some(key), Some(value)) => {
                let (key, value) = (key.parse()?, value.parse()?);
                tree.insert(key, value);
                println!("{}", tree.dump());
            }
            ("d", Some(key), None) => {
                let key = key.parse()?;
                if let Some(value) = tree.remove(&key) {
                    println!("removed {key} with value {value}");
                }
                print!("{}", tree.dump());
            }
            _ => eprintln!("usage: i <key> <value> | d <key>"),
        }
    }
}
