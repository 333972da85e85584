//! CLI tool to manage activity categories.
//!
//! Usage:
//!   cargo run --bin manage-categories -- list
//!   cargo run --bin manage-categories -- add --name <name>
//!   cargo run --bin manage-categories -- remove --id <category-id>

use std::env;

use airlibre_lib::config::Config;
use airlibre_lib::db::DbPool;
use airlibre_lib::models::validation::validate_category_name;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let command = &args[1];
    if matches!(command.as_str(), "help" | "--help" | "-h") {
        print_usage();
        return;
    }

    // Initialize database
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    };

    let pool = match DbPool::new(&config).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error connecting to database: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = pool.run_migrations().await {
        eprintln!("Error running migrations: {}", e);
        std::process::exit(1);
    }

    match command.as_str() {
        "list" | "ls" => list_categories(&pool).await,
        "add" => {
            let name = parse_arg(&args, "--name", "-n");
            add_category(&pool, &name).await;
        }
        "remove" | "rm" => {
            let id = parse_arg(&args, "--id", "-i");
            let Ok(id) = id.parse::<i32>() else {
                eprintln!("Error: --id must be a number");
                std::process::exit(1);
            };
            remove_category(&pool, id).await;
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            std::process::exit(1);
        }
    }
}

fn parse_arg(args: &[String], long: &str, short: &str) -> String {
    let mut i = 2;
    while i < args.len() {
        if (args[i] == long || args[i] == short) && i + 1 < args.len() {
            return args[i + 1].clone();
        }
        i += 1;
    }
    eprintln!("Error: {} is required", long);
    std::process::exit(1);
}

async fn list_categories(pool: &DbPool) {
    let categories = match pool.list_categories().await {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error listing categories: {}", e);
            std::process::exit(1);
        }
    };

    if categories.is_empty() {
        println!("No categories found.");
        return;
    }

    println!();
    println!("{:<8} {:<40}", "ID", "NAME");
    println!("{}", "-".repeat(48));
    for category in categories {
        println!("{:<8} {:<40}", category.id, category.name);
    }
    println!();
}

async fn add_category(pool: &DbPool, name: &str) {
    let name = match validate_category_name(name) {
        Ok(name) => name,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    match pool.get_category_by_name(&name).await {
        Ok(Some(existing)) => {
            eprintln!(
                "Category \"{}\" already exists with id {}.",
                existing.name, existing.id
            );
            std::process::exit(1);
        }
        Ok(None) => {}
        Err(e) => {
            eprintln!("Error looking up category: {}", e);
            std::process::exit(1);
        }
    }

    match pool.create_category(&name).await {
        Ok(category) => {
            println!("Category \"{}\" created with id {}.", category.name, category.id);
        }
        Err(e) => {
            eprintln!("Error creating category: {}", e);
            std::process::exit(1);
        }
    }
}

async fn remove_category(pool: &DbPool, id: i32) {
    match pool.delete_category(id).await {
        Ok(true) => {
            println!("Category {} removed. Its activities are now uncategorized.", id);
        }
        Ok(false) => {
            eprintln!("Category {} not found.", id);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error removing category: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    eprintln!();
    eprintln!("Usage: manage-categories <command> [options]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  list, ls                List all categories");
    eprintln!("  add --name <name>       Create a category");
    eprintln!("  remove --id <id>        Delete a category");
    eprintln!("  help                    Show this help");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  manage-categories list");
    eprintln!("  manage-categories add --name Hiking");
    eprintln!("  manage-categories remove --id 3");
    eprintln!();
}
