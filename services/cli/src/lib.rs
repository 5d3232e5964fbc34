mod cli;
mod rapidapi;
mod render;

use house_hunter::error::AppError;

pub fn run() -> Result<(), AppError> {
    cli::run()
}
