use clap::Parser;
use diecast_scan::{cli, config, error, import, lookup, ocr, resolver, review, scanner, store};
use diecast_scan_common::{extract_fields_with, is_recognized, merge_record};
use cli::{Cli, Commands};
use config::Config;
use error::{DiecastError, Result};
use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let mut config = Config::load()?;

    match cli.command {
        Commands::Scan { images, folder, catalog, rules, preset, output, no_review, save, use_cache, language } => {
            println!("🚗 diecast-scan - パッケージ読み取り\n");

            // 1. 画像収集
            println!("[1/3] 画像を収集中...");
            let paths = scanner::collect_images(&images, folder.as_deref())?;
            if paths.is_empty() {
                let target = folder.map(|f| f.display().to_string()).unwrap_or_else(|| "(引数なし)".into());
                return Err(DiecastError::NoImagesFound(target));
            }
            let sources = scanner::load_images(&paths);
            println!("✔ {}枚の画像\n", sources.len());

            // 2. OCR・解決
            println!("[2/3] OCR解析中...{}", if use_cache { " (キャッシュ有効)" } else { "" });
            let catalog = Arc::new(config.load_catalog(catalog.as_deref())?);
            let rules = Arc::new(config.load_rules(rules.as_deref(), preset.as_deref())?);
            let language = language.unwrap_or_else(|| config.ocr_language.clone());
            let tesseract = ocr::TesseractCli::from_config(&config);

            let resolution = if use_cache {
                let cached = Arc::new(ocr::CachedOcrEngine::new(tesseract, &config.cache_dir()?));
                let resolver = resolver::Resolver::new(cached.clone(), catalog, rules, language);
                let resolution = resolver.resolve(&sources).await;
                cached.persist()?;
                resolution
            } else {
                let resolver = resolver::Resolver::new(Arc::new(tesseract), catalog, rules, language);
                resolver.resolve(&sources).await
            };

            if resolution.failed_images.len() == sources.len() {
                println!("⚠ すべての画像でOCRに失敗しました");
            }
            println!(
                "✔ 解析完了{}\n",
                if resolution.recognized { "" } else { "（認識できませんでした）" }
            );

            // 3. 確認・保存
            println!("[3/3] 確認中...");
            let record = if no_review {
                review::print_record(&resolution.record);
                Some(resolution.record.clone())
            } else {
                review::review_resolution(&resolution)?
            };

            let Some(record) = record else {
                println!("\n破棄しました");
                return Ok(());
            };

            if let Some(output) = output {
                let mut resolution = resolution;
                resolution.record = record.clone();
                std::fs::write(&output, serde_json::to_string_pretty(&resolution)?)?;
                println!("✔ 結果を保存: {}", output.display());
            }

            if save {
                let mut collection = store::CollectionStore::open(&config.store_path()?)?;
                let added = collection.add_to_collection(&record, &config.collector)?;
                collection.save()?;
                println!(
                    "✔ コレクションに追加しました (#{}{})",
                    added.owned_id,
                    if added.new_master { ", 新規車種" } else { "" }
                );
            }

            println!("\n✅ 完了");
        }

        Commands::Extract { input, catalog, rules, preset } => {
            let text = if input.as_os_str() == "-" {
                let mut buf = String::new();
                std::io::stdin().read_to_string(&mut buf)?;
                buf
            } else {
                if !input.exists() {
                    return Err(DiecastError::FileNotFound(input.display().to_string()));
                }
                std::fs::read_to_string(&input)?
            };

            let catalog = config.load_catalog(catalog.as_deref())?;
            let rules = config.load_rules(rules.as_deref(), preset.as_deref())?;

            let candidates = extract_fields_with(&text, &rules);
            let catalog_match = catalog.match_catalog(
                candidates.model_name.as_deref(),
                candidates.identifier_code.as_deref(),
            );
            let output = serde_json::json!({
                "candidates": candidates,
                "catalogMatch": catalog_match,
                "record": merge_record(catalog_match, &candidates),
                "recognized": is_recognized(&candidates, catalog_match),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Commands::Lookup { code, catalog, offline } => {
            let catalog = Arc::new(config.load_catalog(catalog.as_deref())?);
            let resolver = if offline {
                lookup::IdentifierResolver::new(vec![Box::new(lookup::LocalDatasetStage::new(catalog))])
            } else {
                lookup::IdentifierResolver::standard(catalog, lookup::RemoteLookupStage::from_config(&config))
            };

            match resolver.resolve_by_identifier(&code).await? {
                lookup::LookupOutcome::Found { product, source } => {
                    println!("✔ 見つかりました ({})", source);
                    println!("{}", serde_json::to_string_pretty(&product)?);
                }
                lookup::LookupOutcome::NotFound => {
                    println!("見つかりませんでした: {}", code.trim());
                }
            }
        }

        Commands::Garage { search, brand, condition, treasure, json } => {
            let collection = store::CollectionStore::open(&config.store_path()?)?;
            let filter = store::GarageFilter { search, brand, condition, treasure };
            let items = collection.list(&filter);

            if json {
                println!("{}", serde_json::to_string_pretty(&items)?);
                return Ok(());
            }

            println!("🏁 ガレージ: {}台 / 全{}台", items.len(), collection.len());
            for item in &items {
                let mut badges = Vec::new();
                if item.owned.is_super_treasure_hunt {
                    badges.push("STH");
                } else if item.owned.is_treasure_hunt {
                    badges.push("TH");
                }
                println!(
                    "  #{:<4} {} ({}) {} [{}] {}",
                    item.owned.id,
                    item.master.model_name,
                    item.master.brand,
                    item.master.series,
                    item.owned.condition.label(),
                    badges.join(" ")
                );
            }
            let brands = collection.brands();
            if !brands.is_empty() {
                println!("\nブランド: {}", brands.join(", "));
            }
        }

        Commands::Stats => {
            let collection = store::CollectionStore::open(&config.store_path()?)?;
            let stats = collection.stats(chrono::Local::now().date_naive());
            println!("📊 コレクション統計");
            println!("  所有台数: {}", stats.total);
            println!("  トレジャーハント: {}", stats.treasure_hunts);
            println!("  今月の追加: {}", stats.added_this_month);
            println!("  収集日数: {}日", stats.days_collecting);
        }

        Commands::ImportCatalog { from, to, output } => {
            if from > to {
                return Err(DiecastError::Config(format!("年の範囲が不正です: {}..{}", from, to)));
            }
            println!("📥 diecast-scan - カタログ取り込み\n");
            println!("[1/2] {}〜{}年を取得中...", from, to);
            let entries = import::import_catalog(
                &config.import_endpoint,
                from..=to,
                Duration::from_secs(config.timeout_seconds),
            )
            .await?;
            println!("✔ {}件\n", entries.len());

            println!("[2/2] 保存中...");
            import::write_catalog(&output, &entries)?;
            println!("✔ 保存: {}", output.display());
        }

        Commands::Config { show, set_language, set_lookup_endpoint, set_catalog, set_rules, set_preset, set_collector } => {
            let mut changed = false;
            if let Some(language) = set_language {
                config.ocr_language = language;
                changed = true;
            }
            if let Some(endpoint) = set_lookup_endpoint {
                config.lookup_endpoint = endpoint;
                changed = true;
            }
            if let Some(path) = set_catalog {
                config.catalog_path = Some(path);
                changed = true;
            }
            if let Some(path) = set_rules {
                config.rules_path = Some(path);
                changed = true;
            }
            if let Some(preset) = set_preset {
                // 保存前に名前を検証
                diecast_scan_common::RuleTable::from_preset(&preset)?;
                config.rules_preset = preset;
                changed = true;
            }
            if let Some(collector) = set_collector {
                config.collector = collector;
                changed = true;
            }
            if changed {
                config.save()?;
                println!("✔ 設定を保存しました");
            }

            if show || !changed {
                println!("設定:");
                println!("  OCRコマンド: {}", config.ocr_command);
                println!("  OCR言語: {}", config.ocr_language);
                println!("  最大画像サイズ: {}px", config.max_image_size);
                println!("  検索API: {}", config.lookup_endpoint());
                println!("  タイムアウト: {}秒", config.timeout_seconds);
                println!(
                    "  カタログ: {}",
                    config.catalog_path.as_ref().map(|p| p.display().to_string()).unwrap_or_else(|| "同梱データ".into())
                );
                println!(
                    "  抽出ルール: {}",
                    config.rules_path.as_ref().map(|p| p.display().to_string()).unwrap_or_else(|| "なし".into())
                );
                println!("  ルールプリセット: {}", config.rules_preset);
                println!("  保存先: {}", config.store_path()?.display());
                println!("  コレクター: {}", config.collector);
            }
        }

        Commands::Cache { clear, info } => {
            let dir = config.cache_dir()?;
            let cache_path = ocr::cache::CacheFile::cache_path(&dir);

            if info || !clear {
                if cache_path.exists() {
                    let cache = ocr::cache::CacheFile::load(&dir);
                    println!("キャッシュ情報:");
                    println!("  パス: {}", cache_path.display());
                    println!("  件数: {}", cache.len());
                    if let Ok(meta) = std::fs::metadata(&cache_path) {
                        println!("  サイズ: {} bytes", meta.len());
                    }
                } else {
                    println!("キャッシュファイルが存在しません: {}", cache_path.display());
                }
            }

            if clear {
                match ocr::cache::CacheFile::clear(&dir) {
                    Ok(true) => println!("✔ キャッシュを削除しました: {}", cache_path.display()),
                    Ok(false) => println!("キャッシュファイルが存在しません"),
                    Err(e) => println!("キャッシュ削除エラー: {}", e),
                }
            }
        }
    }

    Ok(())
}
