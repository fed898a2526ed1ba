use std::sync::Arc;

use crate::commands::base_commands::Commands;
use crate::services::project_store::ProjectStore;
use crate::services::server::routes;
use warp::Filter;

pub async fn serve_command(cmd: Commands) {
    if let Commands::Serve { port, data_dir } = cmd {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

        let store = match ProjectStore::open(&data_dir) {
            Ok(store) => store,
            Err(e) => {
                eprintln!("Failed to open project store: {e:?}");
                return;
            }
        };

        let filter = routes(Arc::new(store)).with(warp::log("cashforecast"));
        let (addr, server) = match warp::serve(filter).try_bind_ephemeral(([0, 0, 0, 0], port)) {
            Ok(bound) => bound,
            Err(e) => {
                eprintln!("Failed to bind server: {e:?}");
                return;
            }
        };
        println!("listening on http://{addr}");
        server.await;
    }
}
