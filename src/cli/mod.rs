//! Command-line client for the Knit Portal API.
//!
//! Subcommands talk to a running server over HTTP. `login` persists the
//! session to local storage; authenticated commands load it once at
//! startup and refuse politely when it is missing or expired.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use reqwest::Client;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use crate::api::auth::{CurrentUserResponse, LoginResponse};
use crate::api::ErrorResponse;
use crate::config::Config;
use crate::fees::format_currency;
use crate::profile::ParentProfile;
use crate::registration::{sample_roster, Step, Wizard, CONFIRMATIONS};
use crate::session::{Session, SessionStore};

/// CLI arguments structure
#[derive(Parser, Debug)]
#[command(name = "knit-portal")]
#[command(author, version, about = "Parent portal server and CLI for Knit Edu schools", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "knit-portal.toml")]
    pub config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// API URL to connect to
    #[arg(long, env = "KNIT_PORTAL_API_URL")]
    pub api_url: Option<String>,

    /// Session file override (default from config)
    #[arg(long, env = "KNIT_PORTAL_SESSION_FILE")]
    pub session_file: Option<PathBuf>,

    /// Subcommand to run (if none, starts the server)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show server health
    Status,

    /// Create a parent account
    Signup {
        /// Display name, quoted if it contains spaces
        full_name: String,
        email: String,
        /// Password (or set KNIT_PORTAL_PASSWORD)
        #[arg(long, env = "KNIT_PORTAL_PASSWORD")]
        password: String,
    },

    /// Log in and persist the session
    Login {
        email: String,
        /// Password (or set KNIT_PORTAL_PASSWORD)
        #[arg(long, env = "KNIT_PORTAL_PASSWORD")]
        password: String,
    },

    /// Forget the saved session
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Profile commands
    #[command(subcommand)]
    Profile(ProfileCommands),

    /// List financing plans
    Plans,

    /// Show the fee forecast and payment-plan options
    Forecast {
        /// Also ask the AI assistant for a summary of the position
        #[arg(long)]
        insights: bool,
    },

    /// School notices
    Notices {
        /// Show one notice in full
        id: Option<String>,
    },

    /// Ask the AI assistant a question
    Chat { message: String },

    /// Run the re-registration wizard
    Register,

    /// Configuration management commands
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// Show the merged profile
    Show,
    /// Update name, email and phone
    Update {
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        location: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Validate configuration file
    Check,
}

struct ClientContext {
    http: Client,
    api_url: String,
    store: SessionStore,
}

impl ClientContext {
    fn new(cli: &Cli, config: &Config) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        let api_url = cli
            .api_url
            .clone()
            .unwrap_or_else(|| config.client.api_url.clone())
            .trim_end_matches('/')
            .to_string();
        let session_file = cli
            .session_file
            .clone()
            .unwrap_or_else(|| config.client.session_file.clone());
        Ok(Self {
            http,
            api_url,
            store: SessionStore::new(session_file),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    fn session(&self) -> Result<Session> {
        match self.store.load()? {
            Some(session) => Ok(session),
            None => bail!("Not logged in. Run `knit-portal login <email>` first."),
        }
    }

    /// Extracts the error envelope's message from a failed response.
    async fn fail(response: reqwest::Response) -> anyhow::Error {
        let status = response.status();
        match response.json::<ErrorResponse>().await {
            Ok(body) => anyhow::anyhow!("{}", body.error.message),
            Err(_) => anyhow::anyhow!("Request failed with status {}", status),
        }
    }
}

pub async fn run(mut cli: Cli) -> Result<()> {
    let Some(command) = cli.command.take() else {
        bail!("No subcommand given");
    };

    let config = Config::load(&cli.config)?;
    let ctx = ClientContext::new(&cli, &config)?;

    match command {
        Commands::Status => status(&ctx).await,
        Commands::Signup {
            full_name,
            email,
            password,
        } => signup(&ctx, &full_name, &email, &password).await,
        Commands::Login { email, password } => login(&ctx, &email, &password).await,
        Commands::Logout => logout(&ctx),
        Commands::Whoami => whoami(&ctx).await,
        Commands::Profile(ProfileCommands::Show) => profile_show(&ctx).await,
        Commands::Profile(ProfileCommands::Update {
            full_name,
            email,
            phone,
            location,
        }) => profile_update(&ctx, &full_name, &email, &phone, location).await,
        Commands::Plans => plans(&ctx).await,
        Commands::Forecast { insights } => forecast(&ctx, insights).await,
        Commands::Notices { id } => notices(&ctx, id).await,
        Commands::Chat { message } => chat(&ctx, &message).await,
        Commands::Register => register(&ctx).await,
        Commands::Config(ConfigCommands::Check) => config_check(&cli, &config),
    }
}

async fn status(ctx: &ClientContext) -> Result<()> {
    let response = ctx
        .http
        .get(ctx.url("/health"))
        .send()
        .await
        .context("Could not reach the server")?;

    if response.status().is_success() {
        println!("Server is up at {}", ctx.api_url);
    } else {
        bail!("Server responded with status {}", response.status());
    }
    Ok(())
}

async fn signup(ctx: &ClientContext, full_name: &str, email: &str, password: &str) -> Result<()> {
    let response = ctx
        .http
        .post(ctx.url("/auth/signup"))
        .json(&serde_json::json!({
            "fullName": full_name,
            "email": email,
            "password": password,
        }))
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(ClientContext::fail(response).await);
    }

    println!("Account created for {}. You can log in now.", email);
    Ok(())
}

async fn login(ctx: &ClientContext, email: &str, password: &str) -> Result<()> {
    let response = ctx
        .http
        .post(ctx.url("/auth/login"))
        .json(&serde_json::json!({ "email": email, "password": password }))
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(ClientContext::fail(response).await);
    }

    let body: LoginResponse = response.json().await?;

    // Read the expiry out of the token payload; fall back to the default
    // lifetime when the claim is unreadable.
    let expires_at = token_expiry(&body.token)
        .unwrap_or_else(|| chrono::Utc::now() + chrono::Duration::days(7));
    let session = Session {
        user_id: body.user.id.clone(),
        email: body.user.email.clone(),
        full_name: body.user.full_name.clone(),
        token: body.token,
        expires_at,
    };
    ctx.store.save(&session)?;

    let name = if session.full_name.is_empty() {
        session.email.as_str()
    } else {
        session.full_name.as_str()
    };
    println!("Logged in as {}.", name);
    println!("Session saved to {}.", ctx.store.path().display());
    Ok(())
}

fn logout(ctx: &ClientContext) -> Result<()> {
    ctx.store.clear()?;
    println!("Logged out.");
    Ok(())
}

async fn whoami(ctx: &ClientContext) -> Result<()> {
    let session = ctx.session()?;
    let response = ctx
        .http
        .get(ctx.url("/auth/me"))
        .bearer_auth(&session.token)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(ClientContext::fail(response).await);
    }

    let body: CurrentUserResponse = response.json().await?;
    println!("{}", body.user.full_name);
    println!("  id:    {}", body.user.id);
    println!("  email: {}", body.user.email);
    Ok(())
}

async fn profile_show(ctx: &ClientContext) -> Result<()> {
    let session = ctx.session()?;
    let response = ctx
        .http
        .get(ctx.url("/profile/me"))
        .bearer_auth(&session.token)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(ClientContext::fail(response).await);
    }

    let profile: ParentProfile = response.json().await?;
    println!("{}", profile.full_name);
    println!("  email:        {}", profile.email);
    println!("  phone:        {}", profile.phone);
    println!("  relationship: {}", profile.relationship);
    if !profile.id_number.is_empty() {
        println!("  id number:    {}", profile.id_number);
    }
    if !profile.bank_name.is_empty() {
        println!("  bank:         {} ({})", profile.bank_name, profile.account_type);
        println!("  account:      {}", profile.account_number);
        println!("  branch code:  {}", profile.branch_code);
    }
    if !profile.selected_plan.is_empty() {
        println!("  plan:         {}", profile.selected_plan);
    }
    Ok(())
}

async fn profile_update(
    ctx: &ClientContext,
    full_name: &str,
    email: &str,
    phone: &str,
    location: Option<String>,
) -> Result<()> {
    let session = ctx.session()?;
    let response = ctx
        .http
        .put(ctx.url("/profile/me"))
        .bearer_auth(&session.token)
        .json(&serde_json::json!({
            "fullName": full_name,
            "email": email,
            "phone": phone,
            "location": location,
        }))
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(ClientContext::fail(response).await);
    }

    println!("Profile updated.");
    Ok(())
}

async fn plans(ctx: &ClientContext) -> Result<()> {
    let session = ctx.session()?;
    let response = ctx
        .http
        .get(ctx.url("/plans"))
        .bearer_auth(&session.token)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(ClientContext::fail(response).await);
    }

    let body: crate::api::PlansResponse = response.json().await?;
    for plan in body.plans {
        println!(
            "{:10} {} - {} {}",
            plan.id,
            plan.title,
            format_currency(plan.amount),
            plan.period
        );
        for feature in plan.features {
            println!("             - {}", feature);
        }
    }
    Ok(())
}

async fn forecast(ctx: &ClientContext, insights: bool) -> Result<()> {
    let session = ctx.session()?;
    let response = ctx
        .http
        .get(ctx.url("/fees/forecast"))
        .bearer_auth(&session.token)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(ClientContext::fail(response).await);
    }

    let body: crate::api::ForecastResponse = response.json().await?;
    let s = &body.schedule;
    println!("{} ({}, {})", s.student_name, s.grade, s.student_id);
    println!("  annual fees:        {}", format_currency(s.annual_fees));
    println!("  term fees:          {}", format_currency(s.term_fees));
    println!("  sport fees:         {}", format_currency(s.sport_fees));
    println!("  registration:       {}", format_currency(s.registration_fee));
    println!("  re-registration:    {}", format_currency(s.re_registration_fee));
    println!("  total:              {}", format_currency(s.total_fees));
    println!("  outstanding:        {}", format_currency(s.outstanding_amount));
    println!();
    println!("Payment plan options:");
    for plan in body.payment_plans {
        println!(
            "  {:20} {} {} ({}% off: {})",
            plan.name,
            format_currency(plan.amount),
            plan.frequency.to_lowercase(),
            plan.discount_percent,
            format_currency(plan.discounted_amount)
        );
    }

    if insights {
        let prompt = crate::assistant::billing_insights_prompt(&body.schedule);
        let response = ctx
            .http
            .post(ctx.url("/ai/chat"))
            .bearer_auth(&session.token)
            .json(&serde_json::json!({
                "message": prompt,
                "conversationHistory": [],
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ClientContext::fail(response).await);
        }

        let body: crate::api::ChatResponse = response.json().await?;
        println!();
        println!("{}", body.response);
    }
    Ok(())
}

async fn notices(ctx: &ClientContext, id: Option<String>) -> Result<()> {
    let session = ctx.session()?;

    if let Some(id) = id {
        let response = ctx
            .http
            .get(ctx.url(&format!("/notices/{}", id)))
            .bearer_auth(&session.token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ClientContext::fail(response).await);
        }

        let notice: crate::notices::Notice = response.json().await?;
        println!("{} ({})", notice.title, notice.date);
        println!();
        println!("{}", notice.full_message);
        return Ok(());
    }

    let response = ctx
        .http
        .get(ctx.url("/notices"))
        .bearer_auth(&session.token)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(ClientContext::fail(response).await);
    }

    let body: crate::api::NoticesResponse = response.json().await?;
    println!("{} notices, {} unread", body.notices.len(), body.unread_count);
    for notice in body.notices {
        let marker = if notice.is_read { " " } else { "*" };
        println!("{} [{}] {} - {}", marker, notice.id, notice.title, notice.date);
    }
    Ok(())
}

async fn chat(ctx: &ClientContext, message: &str) -> Result<()> {
    let session = ctx.session()?;
    let response = ctx
        .http
        .post(ctx.url("/ai/chat"))
        .bearer_auth(&session.token)
        .json(&serde_json::json!({
            "message": message,
            "conversationHistory": [],
        }))
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(ClientContext::fail(response).await);
    }

    let body: crate::api::ChatResponse = response.json().await?;
    println!("{}", body.response);
    Ok(())
}

fn config_check(cli: &Cli, config: &Config) -> Result<()> {
    println!("Configuration file: {}", cli.config.display());
    match config.validate_for_server() {
        Ok(()) => {
            println!("Configuration is valid for serving.");
            Ok(())
        }
        Err(e) => {
            println!("Configuration problem: {}", e);
            Err(e)
        }
    }
}

/// Reads the `exp` claim from a token without verifying the signature.
/// The client only needs it to know when to throw the session away.
fn token_expiry(token: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;

    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    let exp = claims.get("exp")?.as_i64()?;
    chrono::DateTime::from_timestamp(exp, 0)
}

// ----------------------------------------------------------------------------
// Interactive re-registration wizard
// ----------------------------------------------------------------------------

fn prompt(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Prompt with a prefilled default accepted by pressing Enter.
fn prompt_with_default(label: &str, default: &str) -> Result<String> {
    let value = prompt(&format!("{} [{}]", label, default))?;
    if value.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(value)
    }
}

fn prompt_yes_no(label: &str) -> Result<bool> {
    let value = prompt(&format!("{} (y/n)", label))?;
    Ok(matches!(value.as_str(), "y" | "Y" | "yes" | "Yes"))
}

/// Runs the wizard over stdin. The draft lives only for the duration of
/// this call and is dropped afterwards, complete or not; nothing is sent
/// to the server.
async fn register(ctx: &ClientContext) -> Result<()> {
    // A session is required to enter the flow, matching the app.
    let session = ctx.session()?;
    println!("Re-registration for {}", session.email);

    let roster = sample_roster();
    let mut wizard = Wizard::new();

    while !wizard.is_complete() {
        println!();
        println!(
            "Step {} of 6 - {}",
            wizard.step().number(),
            wizard.step().title()
        );

        match wizard.step() {
            Step::SelectChildren => {
                for student in &roster {
                    let selected = wizard
                        .draft()
                        .selected_students
                        .iter()
                        .any(|s| s == &student.id);
                    let marker = if selected { "x" } else { " " };
                    println!(
                        "  [{}] {}. {} ({}, {})",
                        marker, student.id, student.name, student.grade, student.student_number
                    );
                }
                let choice = prompt("Toggle a learner id, or press Enter to continue")?;
                if !choice.is_empty() {
                    wizard.toggle_student(&choice);
                    continue;
                }
            }
            Step::UpdateDetails => {
                let details = wizard.draft().details.clone();
                let d = wizard.draft_mut();
                d.details.first_name = prompt_with_default("First name", &details.first_name)?;
                d.details.last_name = prompt_with_default("Last name", &details.last_name)?;
                d.details.current_grade =
                    prompt_with_default("Current grade", &details.current_grade)?;
                d.details.next_grade = prompt_with_default("Next grade", &details.next_grade)?;
                d.details.phone = prompt_with_default("Phone", &details.phone)?;
                d.details.email = prompt_with_default("Email", &details.email)?;
                d.details.street = prompt_with_default("Street", &details.street)?;
                d.details.city = prompt_with_default("City", &details.city)?;
                d.details.province = prompt_with_default("Province", &details.province)?;
                d.details.postcode = prompt_with_default("Postcode", &details.postcode)?;
                d.details.account_holder_name =
                    prompt_with_default("Account holder", &details.account_holder_name)?;
                d.details.bank_name = prompt_with_default("Bank name", &details.bank_name)?;
                d.details.account_type =
                    prompt_with_default("Account type", &details.account_type)?;
                d.details.account_number =
                    prompt_with_default("Account number", &details.account_number)?;
                d.details.branch_code = prompt_with_default("Branch code", &details.branch_code)?;
            }
            Step::ChooseFinancing => {
                let plans = crate::fees::financing_plans();
                for plan in &plans {
                    println!(
                        "  {:10} {} - {} {}",
                        plan.id,
                        plan.title,
                        format_currency(plan.amount),
                        plan.period
                    );
                }
                let choice = prompt("Plan id")?;
                if plans.iter().any(|p| p.id == choice) {
                    wizard.draft_mut().selected_plan = Some(choice);
                } else if !choice.is_empty() {
                    println!("Unknown plan '{}'", choice);
                    continue;
                }
            }
            Step::Declaration => {
                let mut confirmations = [false; CONFIRMATIONS.len()];
                for (i, text) in CONFIRMATIONS.iter().enumerate() {
                    confirmations[i] = prompt_yes_no(text)?;
                }
                let d = wizard.draft_mut();
                d.confirmations = confirmations;
                d.signature = prompt("Digital signature (full name)")?;
                d.signed_at_city = prompt("Signed at (city)")?;
            }
            Step::Review => {
                let draft = wizard.draft();
                println!("  learners:  {}", draft.selected_students.join(", "));
                println!(
                    "  learner:   {} {}, {} -> Grade {}",
                    draft.details.first_name,
                    draft.details.last_name,
                    draft.details.current_grade,
                    draft.details.next_grade
                );
                println!("  plan:      {}", draft.selected_plan.as_deref().unwrap_or("-"));
                println!("  signature: {}", draft.signature);
                if !prompt_yes_no("Submit this registration?")? {
                    let _ = wizard.back();
                    continue;
                }
            }
            Step::Complete => {}
        }

        match wizard.try_advance() {
            Ok(_) => {}
            Err(blocked) => println!("! {}", blocked),
        }
    }

    println!();
    println!("Re-registration complete. Thank you!");
    // Known gap carried over from the app: the draft is discarded here,
    // not submitted to any backend.
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_expiry_reads_the_exp_claim() {
        let token =
            crate::api::auth::mint_token("user-1", "parent@example.com", "secret", 7).unwrap();
        let expiry = token_expiry(&token).unwrap();
        let days = (expiry - chrono::Utc::now()).num_days();
        assert!((6..=7).contains(&days));
    }

    #[test]
    fn token_expiry_rejects_garbage() {
        assert!(token_expiry("not-a-token").is_none());
        assert!(token_expiry("a.b.c").is_none());
    }
}
