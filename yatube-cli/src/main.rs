use clap::{Parser, Subcommand};
use yatube_core::Services;
use yatube_core::domain::form::GroupForm;
use yatube_core::domain::page::{Page, PageRequest};
use yatube_core::domain::post::Post;
use yatube_core::infrastructure::config::AppConfig;
use yatube_core::infrastructure::logging::init_logging;

#[derive(Parser, Debug)]
#[command(name = "yatube", about = "Administration tool for the blog database")]
struct Cli {
    /// Overrides DATABASE_URL.
    #[arg(long)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Applies pending migrations and exits.
    Migrate,
    CreateUser {
        username: String,
    },
    /// Removes a user with their posts, comments and follows.
    DeleteUser {
        username: String,
    },
    CreateGroup {
        #[arg(long)]
        slug: String,
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Deletes a group; its posts stay, without a group.
    DeleteGroup {
        slug: String,
    },
    ListGroups,
    DeletePost {
        id: i64,
    },
    ShowPost {
        id: i64,
    },
    Index {
        #[arg(long)]
        page: Option<String>,
    },
    Group {
        slug: String,
        #[arg(long)]
        page: Option<String>,
    },
    Profile {
        username: String,
        #[arg(long)]
        page: Option<String>,
        /// Username of the viewer, for the following flag.
        #[arg(long)]
        viewer: Option<String>,
    },
    Timeline {
        username: String,
        #[arg(long)]
        page: Option<String>,
    },
    Follow {
        follower: String,
        author: String,
    },
    Unfollow {
        follower: String,
        author: String,
    },
}

fn page_request(config: &AppConfig, page: Option<String>) -> PageRequest {
    PageRequest {
        page_size: config.page_size,
        page,
    }
}

fn print_page(page: &Page<Post>) {
    println!(
        "Page {} of {} ({} posts)",
        page.number, page.num_pages, page.count
    );
    for post in page {
        let group = post
            .group_id
            .map(|id| format!(" [group {id}]"))
            .unwrap_or_default();
        println!(
            "- #{} {} by {}{}: {}",
            post.id,
            post.pub_date.format("%Y-%m-%d %H:%M"),
            post.author_id,
            group,
            post.preview()
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let args = Cli::parse();

    let mut config = AppConfig::from_env()?;
    if let Some(url) = args.database_url {
        config.database_url = url;
    }
    let services: Services = yatube_core::connect(&config).await?;

    match args.command {
        Command::Migrate => println!("Database is up to date."),
        Command::CreateUser { username } => {
            let user = services.users.create_user(&username).await?;
            println!("User created! ID: {}", user.id);
        }
        Command::DeleteUser { username } => {
            services.users.delete_user(&username).await?;
            println!("User {username} deleted.");
        }
        Command::CreateGroup {
            slug,
            title,
            description,
        } => {
            let group = services
                .groups
                .create_group(&GroupForm {
                    title,
                    slug,
                    description,
                })
                .await?;
            println!("Group created! ID: {} ({})", group.id, group.slug);
        }
        Command::DeleteGroup { slug } => {
            services.groups.delete_group(&slug).await?;
            println!("Group {slug} deleted.");
        }
        Command::ListGroups => {
            for group in services.groups.list_groups().await? {
                println!("- [{}] {} ({})", group.id, group.display_name(), group.slug);
            }
        }
        Command::DeletePost { id } => {
            services.posts.delete_post(id).await?;
            println!("Post deleted!");
        }
        Command::ShowPost { id } => {
            let detail = services.posts.get_post(id).await?;
            println!("#{} by {}", detail.post.id, detail.post.author_id);
            println!("{}", detail.post.text);
            if let Some(image) = &detail.post.image {
                println!("image: {image}");
            }
            println!("Comments ({})", detail.comments.len());
            for comment in detail.comments {
                println!("- {} {}: {}", comment.created, comment.author_id, comment.text);
            }
        }
        Command::Index { page } => {
            let page = services
                .feeds
                .list_index(&page_request(&config, page))
                .await?;
            print_page(&page);
        }
        Command::Group { slug, page } => {
            let feed = services
                .feeds
                .list_group(&slug, &page_request(&config, page))
                .await?;
            println!("{}", feed.group.display_name());
            if let Some(description) = &feed.group.description {
                println!("{description}");
            }
            print_page(&feed.page);
        }
        Command::Profile {
            username,
            page,
            viewer,
        } => {
            let viewer = match viewer {
                Some(name) => Some(services.users.identity(&name).await?),
                None => None,
            };
            let feed = services
                .feeds
                .list_profile(&username, &page_request(&config, page), viewer.as_ref())
                .await?;
            println!(
                "{} ({} posts){}",
                feed.author.username,
                feed.count,
                if feed.following { ", followed" } else { "" }
            );
            print_page(&feed.page);
        }
        Command::Timeline { username, page } => {
            let follower = services.users.identity(&username).await?;
            let page = services
                .feeds
                .list_following_feed(&follower, &page_request(&config, page))
                .await?;
            print_page(&page);
        }
        Command::Follow { follower, author } => {
            let follower = services.users.identity(&follower).await?;
            if services.follows.follow(&author, &follower).await? {
                println!("{} now follows {author}.", follower.username);
            } else {
                println!("Nothing to do.");
            }
        }
        Command::Unfollow { follower, author } => {
            let follower = services.users.identity(&follower).await?;
            if services.follows.unfollow(&author, &follower).await? {
                println!("{} unfollowed {author}.", follower.username);
            } else {
                println!("Nothing to do.");
            }
        }
    }

    Ok(())
}
