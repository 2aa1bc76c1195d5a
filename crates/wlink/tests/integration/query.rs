//! Read-only queries against real (or hwsim) radios.

use wlink::Result;
use wlink::netlink::genl::nl80211::{InterfaceType, SocketManager, WiphyBand};

use crate::common;

#[tokio::test]
async fn test_wiphy_dump() -> Result<()> {
    require_wiphy!();

    let mgr = SocketManager::new().await?;
    let wiphys = mgr.get_all_wiphy_info().await?;
    assert!(!wiphys.is_empty());

    for wiphy in &wiphys {
        assert!(wiphy.name.starts_with("phy"), "unexpected name {}", wiphy.name);
        assert!(!wiphy.bands.is_empty());
        assert!(wiphy.supports_iftype(InterfaceType::Station));

        let single = mgr.get_wiphy_info(wiphy.id).await?;
        assert_eq!(single.name, wiphy.name);
        assert_eq!(single.bands.len(), wiphy.bands.len());
    }
    Ok(())
}

#[tokio::test]
async fn test_channels_carry_numbers() -> Result<()> {
    require_wiphy!();

    let mgr = SocketManager::new().await?;
    let wiphy = mgr.get_all_wiphy_info().await?.remove(0);
    if let Some(band) = wiphy.band(WiphyBand::Ghz2) {
        let ch1 = band.channel(2412).expect("2412 MHz on a 2.4 GHz band");
        assert_eq!(ch1.channel, Some(1));
    }
    Ok(())
}

#[tokio::test]
async fn test_interface_info() -> Result<()> {
    require_wiphy!();
    let Some((name, ifindex)) = common::first_wireless() else {
        eprintln!("Skipping test: no wireless interface");
        return Ok(());
    };

    let mgr = SocketManager::new().await?;
    let iface = mgr.get_interface_info(ifindex).await?;
    assert_eq!(iface.name, name);
    assert_eq!(iface.ifindex, ifindex);

    let all = mgr.get_all_interfaces().await?;
    assert!(all.iter().any(|i| i.ifindex == ifindex));
    Ok(())
}

#[tokio::test]
async fn test_non_wireless_interface() -> Result<()> {
    require_wiphy!();

    let mgr = SocketManager::new().await?;
    let lo = wlink::util::name_to_index("lo")?;
    let err = mgr.get_interface_info(lo).await.unwrap_err();
    assert!(err.errno().is_some(), "expected a kernel error, got {err}");
    Ok(())
}

#[tokio::test]
async fn test_survey() -> Result<()> {
    require_wiphy!();
    let Some((_, ifindex)) = common::first_wireless() else {
        return Ok(());
    };

    let mgr = SocketManager::new().await?;
    // hwsim only reports channels it has been on; an empty survey is fine
    for entry in mgr.get_survey_info(ifindex).await? {
        assert!(entry.freq > 0);
    }
    Ok(())
}
