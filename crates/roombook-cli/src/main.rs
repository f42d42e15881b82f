use clap::{Parser, Subcommand};
use dialoguer::{Input, Password};
use dotenvy::dotenv;
use sqlx::PgPool;

use roombook_cli::admin::create_admin;
use roombook_cli::seeder::{self, SeedConfig};
use roombook_db::{init_db_pool, run_migrations};

#[derive(Parser)]
#[command(name = "roombook-cli")]
#[command(about = "Roombook CLI - Administrative tools for Roombook", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an administrator account
    CreateAdmin {
        /// Full name of the admin
        #[arg(short = 'n', long)]
        name: Option<String>,

        /// Email address
        #[arg(short = 'e', long)]
        email: Option<String>,

        /// Password (will be prompted securely if not provided)
        #[arg(short = 'p', long)]
        password: Option<String>,
    },
    /// Seed the database with fake departments, buildings, rooms and users
    Seed {
        /// Number of buildings to create
        #[arg(short = 'b', long, default_value = "3")]
        buildings: usize,

        /// Number of rooms per building
        #[arg(short = 'r', long, default_value = "10")]
        rooms: usize,

        /// Number of departments to create
        #[arg(short = 'd', long, default_value = "4")]
        departments: usize,

        /// Number of teachers per department
        #[arg(short = 't', long, default_value = "5")]
        teachers: usize,

        /// Number of staff users
        #[arg(short = 's', long, default_value = "3")]
        staff: usize,
    },
    /// Clear all seeded data (keeps admins and non-seeded rows)
    ClearSeed,
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let cli = Cli::parse();
    let pool = init_db_pool().await;

    if let Err(e) = run_migrations(&pool).await {
        eprintln!("❌ Failed to apply migrations: {}", e);
        std::process::exit(1);
    }

    let result = match cli.command {
        Commands::CreateAdmin {
            name,
            email,
            password,
        } => handle_create_admin(&pool, name, email, password).await,
        Commands::Seed {
            buildings,
            rooms,
            departments,
            teachers,
            staff,
        } => {
            let config = SeedConfig::new(buildings)
                .with_rooms_per_building(rooms)
                .with_departments(departments, teachers)
                .with_staff(staff);
            seeder::seed_all(&pool, config).await
        }
        Commands::ClearSeed => seeder::clear_all(&pool).await,
    };

    if let Err(e) = result {
        eprintln!("\n❌ Error: {}", e);
        std::process::exit(1);
    }
}

async fn handle_create_admin(
    pool: &PgPool,
    name: Option<String>,
    email: Option<String>,
    password: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let name = match name {
        Some(name) => name,
        None => Input::new().with_prompt("Full name").interact_text()?,
    };

    let email = match email {
        Some(email) => email,
        None => Input::new().with_prompt("Email address").interact_text()?,
    };

    let password = match password {
        Some(password) => password,
        None => Password::new()
            .with_prompt("Password")
            .with_confirmation("Confirm password", "Passwords don't match")
            .interact()?,
    };

    let user_id = create_admin(pool, &name, &email, &password).await?;

    println!("\n✅ Admin created successfully!");
    println!("   ID: {}", user_id);
    println!("   Email: {}", email.trim().to_lowercase());
    println!("   Name: {}", name.trim());

    Ok(())
}
