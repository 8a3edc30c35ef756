use anyhow::Result;

fn main() -> Result<()> {
    chatsync_reader::cli::run()
}
