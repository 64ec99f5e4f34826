use clap::{crate_version, App, AppSettings, Arg, ArgMatches, SubCommand};
use folio::build::{load_project, Error, Project};
use folio::config::{SectionKey, Site, UnknownSectionError};
use folio::listing::{filter_published, homepage, sort_by_recency};
use folio::source::Document;
use std::path::Path;

fn app() -> App<'static, 'static> {
    let dir_arg = Arg::with_name("DIR")
        .help("Project directory (or any directory below it)")
        .default_value(".");

    App::new("folio")
        .version(crate_version!())
        .about("Checks and lists the content of a folio blog")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .multiple(true)
                .help("Increase log verbosity (-v, -vv, -vvv)"),
        )
        .subcommand(
            SubCommand::with_name("check")
                .about("Validates the site configuration and all content")
                .arg(dir_arg.clone()),
        )
        .subcommand(
            SubCommand::with_name("list")
                .about("Prints a section's listing as the site would show it")
                .arg(dir_arg)
                .arg(
                    Arg::with_name("section")
                        .short("s")
                        .long("section")
                        .takes_value(true)
                        .possible_values(&["home", "blog", "projects"])
                        .default_value("home"),
                )
                .arg(
                    Arg::with_name("drafts")
                        .long("drafts")
                        .help("Include drafts in blog and project listings"),
                ),
        )
}

fn main() {
    let matches = app().get_matches();

    init_tracing(matches.occurrences_of("verbose"));

    let result = match matches.subcommand() {
        ("check", Some(args)) => check(args),
        ("list", Some(args)) => list(args),
        _ => Ok(true),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(2);
        }
    }
}

fn init_tracing(verbose: u64) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(level.into()),
        )
        .init();
}

fn project(args: &ArgMatches) -> Result<Project, Error> {
    load_project(Path::new(args.value_of("DIR").unwrap_or(".")))
}

// Returns whether every content file loaded.
fn check(args: &ArgMatches) -> Result<bool, Box<dyn std::error::Error>> {
    let project = project(args)?;
    println!("Configuration: ok ({})", project.site.identity().title);
    println!(
        "Blog posts:    {} loaded, {} rejected",
        project.posts.documents.len(),
        project.posts.rejected.len()
    );
    println!(
        "Projects:      {} loaded, {} rejected",
        project.projects.documents.len(),
        project.projects.rejected.len()
    );

    for rejected in project.rejected() {
        println!();
        println!("✗ {}", rejected.path.display());
        println!("  {}", rejected.error.to_string().replace('\n', "\n  "));
    }

    Ok(project.is_clean())
}

fn section(args: &ArgMatches) -> Result<SectionKey, UnknownSectionError> {
    args.value_of("section").unwrap_or("home").parse()
}

fn list(args: &ArgMatches) -> Result<bool, Box<dyn std::error::Error>> {
    let section = section(args)?;
    let project = project(args)?;
    let site = &project.site;

    let metadata = site.section(section);
    println!("{} | {}", metadata.title, site.identity().title);
    println!("{}", metadata.description);

    match section.content_kind() {
        None => {
            let home = homepage(
                site,
                project.posts.documents.iter().collect(),
                project.projects.documents.iter().collect(),
            );
            print_listing(
                site.section(SectionKey::Blog).title.as_str(),
                &home.posts,
            );
            print_listing(
                site.section(SectionKey::Projects).title.as_str(),
                &home.projects,
            );
        }
        Some(kind) => {
            let documents: Vec<&Document> =
                project.collection(kind).documents.iter().collect();
            let documents = match args.is_present("drafts") {
                true => sort_by_recency(documents),
                false => sort_by_recency(filter_published(documents)),
            };
            print_listing("", &documents);
        }
    }

    print_footer(site);
    Ok(true)
}

fn print_listing(heading: &str, documents: &[&Document]) {
    println!();
    if !heading.is_empty() {
        println!("{}", heading);
    }
    if documents.is_empty() {
        println!("  (nothing yet)");
    }
    for document in documents {
        let entry = &document.entry;
        println!(
            "  {}  {}{}",
            entry.date,
            entry.title,
            if entry.draft { "  [draft]" } else { "" }
        );
        if let Some(url) = entry.demo_link() {
            println!("              demo: {}", url);
        }
        if let Some(url) = entry.repository_link() {
            println!("              repo: {}", url);
        }
    }
}

fn print_footer(site: &Site) {
    println!();
    let links: Vec<String> = site
        .social_links()
        .iter()
        .map(|link| format!("{} <{}>", link.display_name, link.url))
        .collect();
    if !links.is_empty() {
        println!("{}", links.join(" · "));
    }
    println!("{}", site.identity().contact_email.obfuscated());
}

#[cfg(test)]
mod test {
    use super::*;
    use clap::ErrorKind;

    #[test]
    fn test_list_section_argument() {
        let matches = app()
            .get_matches_from_safe(vec!["folio", "list", "--section", "blog"])
            .unwrap();
        let args = matches.subcommand_matches("list").unwrap();
        assert_eq!(section(args), Ok(SectionKey::Blog));
    }

    #[test]
    fn test_list_section_defaults_to_home() {
        let matches =
            app().get_matches_from_safe(vec!["folio", "list"]).unwrap();
        let args = matches.subcommand_matches("list").unwrap();
        assert_eq!(section(args), Ok(SectionKey::Home));
    }

    #[test]
    fn test_list_rejects_unknown_section() {
        let err = app()
            .get_matches_from_safe(vec!["folio", "list", "--section", "about"])
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidValue);
    }

    #[test]
    fn test_unknown_section_is_an_error_not_home() {
        let matches = App::new("folio")
            .arg(Arg::with_name("section").long("section").takes_value(true))
            .get_matches_from(vec!["folio", "--section", "about"]);
        assert_eq!(
            section(&matches),
            Err(UnknownSectionError("about".to_owned()))
        );
    }
}
