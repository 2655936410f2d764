use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    activity_tables::app::run(std::env::args().skip(1))
}
