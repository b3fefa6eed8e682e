// Print the private link (and token) for one or more attendees.
//
//   auth-link 1 2 3

use anyhow::Context;
use devsummit::auth::token::{attendee_link, TokenKey};
use devsummit::config::Settings;

fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env()?;
    let key = TokenKey::new(&settings.secret_key);

    let ids = std::env::args()
        .skip(1)
        .map(|arg| {
            arg.parse::<i64>()
                .with_context(|| format!("'{}' is not a person id", arg))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    if ids.is_empty() {
        anyhow::bail!("usage: auth-link <person-id>...");
    }

    for id in ids {
        println!("{}\t{}\t{}", id, key.person_token(id), attendee_link(&settings.site_url, &key, id));
    }
    Ok(())
}
